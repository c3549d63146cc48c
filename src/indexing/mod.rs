//! Indexing pipeline: traversal, change detection, embedding and statistics.

pub mod fingerprint;
pub mod pipeline;
pub mod stats;
pub mod walker;

pub use fingerprint::{Fingerprint, fingerprint};
pub use pipeline::{Indexer, prune_missing};
pub use stats::{FileOutcome, IndexStats};
pub use walker::FileWalker;
