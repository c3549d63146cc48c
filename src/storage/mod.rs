//! Durable storage for file embeddings.
//!
//! The store is the source of truth across runs. The in-memory search graph
//! is rebuilt from it (and from fresh embeddings) on every run.

pub mod codec;
mod embedding_store;
pub mod error;

pub use codec::{CodecError, decode_vector, encode_vector};
pub use embedding_store::{EmbeddingRecord, EmbeddingStore, RecordStore};
pub use error::{StorageError, StorageResult};
