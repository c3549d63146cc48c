//! Binary encoding for embedding vectors.
//!
//! # Format
//!
//! A vector is stored as its `f32` values, each written as 4 little-endian
//! IEEE-754 bytes, concatenated with no header. The byte length is always
//! `dimension * 4`. Decoding is the exact inverse and preserves bit patterns,
//! so `-0.0` and NaN payloads survive a round trip.

use thiserror::Error;

/// Number of bytes per f32 value.
pub const BYTES_PER_F32: usize = 4;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("buffer of {len} bytes has {trailing} trailing bytes after the last f32")]
    TrailingBytes { len: usize, trailing: usize },
}

/// Encodes a vector into its little-endian byte representation.
#[must_use]
pub fn encode_vector(vector: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(vector.len() * BYTES_PER_F32);
    for &value in vector {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decodes a buffer produced by [`encode_vector`].
///
/// Returns an error if the buffer length is not a multiple of 4.
pub fn decode_vector(bytes: &[u8]) -> Result<Vec<f32>, CodecError> {
    let trailing = bytes.len() % BYTES_PER_F32;
    if trailing != 0 {
        return Err(CodecError::TrailingBytes {
            len: bytes.len(),
            trailing,
        });
    }

    Ok(bytes
        .chunks_exact(BYTES_PER_F32)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
