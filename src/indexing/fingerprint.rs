//! Content fingerprints for change detection.

use sha2::{Digest, Sha256};
use std::fmt;

/// Lowercase hex SHA-256 of a file's raw bytes.
///
/// Only ever compared for equality with the hash stored next to an
/// embedding; it carries no other meaning.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Calculate the fingerprint of `content`.
pub fn fingerprint(content: &[u8]) -> Fingerprint {
    let mut hasher = Sha256::new();
    hasher.update(content);
    Fingerprint(format!("{:x}", hasher.finalize()))
}
