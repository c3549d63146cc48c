//! Exact distance functions between embedding vectors.
//!
//! The search graph ranks candidates with its own (approximate) traversal;
//! these functions recompute exact scores for the returned candidates.

use serde::{Deserialize, Serialize};

/// Exact distances between a query vector and a candidate vector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Distances {
    /// `1 - cosine_similarity`, in `[0, 2]`
    pub cosine: f32,
    /// L2 distance
    pub euclidean: f32,
    /// Sum of squared component differences (squared L2, no root)
    pub sum_squared: f32,
}

impl Distances {
    /// Computes all three distances between `query` and `candidate`.
    ///
    /// Returns `None` when the vectors differ in length.
    #[must_use]
    pub fn between(query: &[f32], candidate: &[f32]) -> Option<Self> {
        if query.len() != candidate.len() {
            return None;
        }
        let sum_squared = sum_squared_difference(query, candidate);
        Some(Self {
            cosine: cosine_distance(query, candidate),
            euclidean: sum_squared.sqrt(),
            sum_squared,
        })
    }
}

/// Computes cosine similarity between two vectors.
///
/// Returns 0.0 when either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

/// Cosine distance, `1 - cosine_similarity`.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}

/// Sum of squared differences.
pub fn sum_squared_difference(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Euclidean (L2) distance.
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    sum_squared_difference(a, b).sqrt()
}
