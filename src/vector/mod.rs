//! Vector similarity: exact distances and the in-memory ANN graph.
//!
//! # Architecture
//! Embeddings are persisted by [`crate::storage`]. Each run feeds them into an
//! HNSW graph ([`HnswIndex`]) that answers the run's query; exact distances
//! ([`Distances`]) are recomputed for the returned candidates so scores do not
//! depend on the graph's approximation.

mod distance;
mod index;

pub use distance::{
    Distances, cosine_distance, cosine_similarity, euclidean_distance, sum_squared_difference,
};
pub use index::{CosineMetric, DEFAULT_EF, HnswIndex, VectorError, VectorIndex};
