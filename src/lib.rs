/// The main library module for codectx
pub mod config;
pub mod embed;
pub mod error;
pub mod indexing;
pub mod io;
pub mod logging;
pub mod retrieve;
pub mod storage;
pub mod vector;

// Explicit exports for better API clarity
pub use config::Settings;
pub use embed::{
    EmbedPurpose, Embedding, EmbeddingError, EmbeddingMeta, EmbeddingProvider, create_provider,
};
pub use error::{IndexError, IndexResult, SetupError};
pub use indexing::{FileOutcome, Fingerprint, IndexStats, Indexer, fingerprint};
pub use retrieve::{QueryEngine, QueryResult, embed_query};
pub use storage::{EmbeddingRecord, EmbeddingStore, RecordStore, StorageError, StorageResult};
pub use vector::{Distances, HnswIndex, VectorIndex};
