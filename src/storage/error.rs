use thiserror::Error;

use super::codec::CodecError;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored embedding for '{id}' is corrupt: {source}")]
    Corrupt { id: String, source: CodecError },
}

impl StorageError {
    /// Get a stable status code for this error type.
    pub fn status_code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "SQLITE_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::Corrupt { .. } => "CORRUPT_EMBEDDING",
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
