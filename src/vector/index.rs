//! In-memory approximate nearest-neighbor index.
//!
//! Wraps an HNSW graph from the `hnsw` crate behind the small [`VectorIndex`]
//! interface the indexing pipeline needs: keyed insertion and k-NN search.
//! The graph is a derived cache rebuilt on every run and is never persisted.

use std::collections::HashMap;

use hnsw::{Hnsw, Searcher};
use rand_pcg::Pcg64;
use space::{Metric, Neighbor};
use thiserror::Error;

use super::distance::cosine_distance;

/// Default search breadth (`ef`) for graph queries.
pub const DEFAULT_EF: usize = 64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VectorError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Cannot index an empty vector for '{key}'")]
    EmptyVector { key: String },
}

/// Keyed vector index supporting incremental insertion and k-NN search.
///
/// Implementations are not required to tolerate concurrent `add` and
/// `search`; callers serialize access.
pub trait VectorIndex: Send {
    /// Inserts `vector` under `key`. Re-adding a key supersedes the old entry.
    fn add(&mut self, key: &str, vector: Vec<f32>) -> Result<(), VectorError>;

    /// Returns up to `k` entries ordered nearest first.
    ///
    /// A query whose length differs from the indexed vectors is an error,
    /// never an empty result.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, Vec<f32>)>, VectorError>;

    /// Dimension fixed by the first inserted vector.
    fn dimension(&self) -> Option<usize>;

    /// Number of live keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Cosine metric in the integer form the graph expects.
///
/// Non-negative `f32` values order the same way as their bit patterns, so
/// the distance is clamped at zero and reinterpreted as `u32`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineMetric;

impl Metric<Vec<f32>> for CosineMetric {
    type Unit = u32;

    fn distance(&self, a: &Vec<f32>, b: &Vec<f32>) -> u32 {
        let d = cosine_distance(a, b);
        if d.is_nan() {
            u32::MAX
        } else {
            d.max(0.0).to_bits()
        }
    }
}

type Graph = Hnsw<CosineMetric, Vec<f32>, Pcg64, 12, 24>;

/// HNSW-backed [`VectorIndex`] using cosine distance.
pub struct HnswIndex {
    graph: Graph,
    searcher: Searcher<u32>,
    /// Graph node → key, in insertion order
    keys: Vec<String>,
    /// Key → its current (live) graph node
    live: HashMap<String, usize>,
    dimension: Option<usize>,
    ef: usize,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnswIndex")
            .field("nodes", &self.keys.len())
            .field("live", &self.live.len())
            .field("dimension", &self.dimension)
            .field("ef", &self.ef)
            .finish()
    }
}

impl Default for HnswIndex {
    fn default() -> Self {
        Self::new(DEFAULT_EF)
    }
}

impl HnswIndex {
    /// Creates an empty index with the given search breadth.
    #[must_use]
    pub fn new(ef: usize) -> Self {
        Self {
            graph: Hnsw::new(CosineMetric),
            searcher: Searcher::default(),
            keys: Vec::new(),
            live: HashMap::new(),
            dimension: None,
            ef: ef.max(1),
        }
    }

    fn is_live(&self, node: usize) -> bool {
        self.keys
            .get(node)
            .and_then(|key| self.live.get(key))
            .is_some_and(|&current| current == node)
    }
}

impl VectorIndex for HnswIndex {
    fn add(&mut self, key: &str, vector: Vec<f32>) -> Result<(), VectorError> {
        if vector.is_empty() {
            return Err(VectorError::EmptyVector {
                key: key.to_string(),
            });
        }
        match self.dimension {
            Some(expected) if expected != vector.len() => {
                return Err(VectorError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => self.dimension = Some(vector.len()),
        }

        if let Some(&node) = self.live.get(key) {
            if self.graph.feature(node) == &vector {
                return Ok(());
            }
        }

        let node = self.graph.insert(vector, &mut self.searcher);
        debug_assert_eq!(node, self.keys.len());
        self.keys.push(key.to_string());
        self.live.insert(key.to_string(), node);
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(String, Vec<f32>)>, VectorError> {
        if let Some(expected) = self.dimension.filter(|&d| d != query.len()) {
            return Err(VectorError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }
        if k == 0 || self.live.is_empty() {
            return Ok(Vec::new());
        }

        // Superseded nodes still live in the graph; over-fetch to skip them.
        let superseded = self.keys.len() - self.live.len();
        let wanted = (k + superseded).min(self.keys.len());
        let ef = self.ef.max(wanted);

        let mut searcher = Searcher::default();
        let mut dest = vec![
            Neighbor {
                index: !0,
                distance: !0
            };
            wanted
        ];
        let query = query.to_vec();
        let found = self.graph.nearest(&query, ef, &mut searcher, &mut dest);

        let mut neighbors: Vec<Neighbor<u32>> = found
            .iter()
            .copied()
            .filter(|n| self.is_live(n.index))
            .collect();
        neighbors.sort_by_key(|n| (n.distance, n.index));

        Ok(neighbors
            .into_iter()
            .take(k)
            .map(|n| (self.keys[n.index].clone(), self.graph.feature(n.index).clone()))
            .collect())
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    fn len(&self) -> usize {
        self.live.len()
    }
}
