//! Error types for the indexing pipeline
//!
//! This module provides structured error types using thiserror for better
//! error handling and actionable error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::embed::EmbeddingError;
use crate::storage::StorageError;
use crate::vector::VectorError;

/// Main error type for indexing and query operations
#[derive(Error, Debug)]
pub enum IndexError {
    /// File system errors
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Terminal I/O errors (reading the query, writing results)
    #[error("Failed to {action}: {source}")]
    Io {
        action: &'static str,
        source: std::io::Error,
    },

    /// Embedding store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Embedding provider errors
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// In-memory graph rejected a vector
    #[error("Vector index error: {0}")]
    Vector(#[from] VectorError),

    /// The store reported a matching hash but returned no record for the id
    #[error("Inconsistent embedding store: hash matched for '{id}' but no record was returned")]
    Consistency { id: String },

    /// Startup errors (provider, store, configuration)
    #[error(transparent)]
    Setup(#[from] SetupError),

    /// Invalid invocation
    #[error("{0}")]
    Usage(String),

    /// The run was cancelled before it finished
    #[error("Indexing run was cancelled")]
    Cancelled,
}

/// An unusable provider, store or configuration at startup.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Unknown embedding provider '{name}'. Supported providers: ollama, voyage")]
    UnknownProvider { name: String },

    #[error("Missing API key for {provider}: {reason}")]
    MissingApiKey { provider: String, reason: String },

    #[error("Failed to build HTTP client for {provider}: {source}")]
    HttpClient {
        provider: String,
        source: reqwest::Error,
    },

    #[error("Failed to open embedding store '{path}': {source}")]
    Store { path: PathBuf, source: StorageError },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;

impl IndexError {
    /// Get a status code for this error type
    pub fn status_code(&self) -> String {
        match self {
            Self::FileRead { .. } => "FILE_READ_ERROR",
            Self::Io { .. } => "IO_ERROR",
            Self::Storage(e) => e.status_code(),
            Self::Embedding(_) => "EMBEDDING_ERROR",
            Self::Vector(_) => "VECTOR_ERROR",
            Self::Consistency { .. } => "INDEX_INCONSISTENT",
            Self::Setup(SetupError::Config(_)) => "CONFIG_ERROR",
            Self::Setup(_) => "SETUP_ERROR",
            Self::Usage(_) => "USAGE_ERROR",
            Self::Cancelled => "CANCELLED",
        }
        .to_string()
    }

    /// Get recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            Self::FileRead { .. } => vec![
                "Check that the file exists and you have read permissions",
                "Ensure the file is not locked by another process",
            ],
            Self::Io { .. } => vec![
                "Check that standard input and output are open",
                "Pass the query as an argument instead of piping it",
            ],
            Self::Consistency { .. } => vec![
                "Delete the embeddings database to rebuild it from scratch",
                "Check for disk errors or concurrent writers on the database",
            ],
            Self::Embedding(_) => vec![
                "Check that the embedding provider is running and reachable",
                "Verify embedding.provider and the model name in settings.toml",
            ],
            Self::Setup(SetupError::MissingApiKey { .. }) => vec![
                "Export the key in the variable named by embedding.voyage.api_key_env",
                "Or point embedding.voyage.api_key_file at a file containing the key",
            ],
            Self::Setup(SetupError::UnknownProvider { .. }) => {
                vec!["Set embedding.provider to 'ollama' or 'voyage'"]
            }
            Self::Setup(SetupError::Store { .. }) | Self::Storage(_) => vec![
                "Check permissions on the database directory",
                "Use --db to point at a different database file",
            ],
            Self::Vector(VectorError::DimensionMismatch { .. }) => vec![
                "The embedding model changed since the database was built",
                "Delete the embeddings database or switch back to the previous model",
            ],
            Self::Usage(_) => vec!["Run 'codectx --help' for usage"],
            _ => vec![],
        }
    }
}
