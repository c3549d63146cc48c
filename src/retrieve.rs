//! Query path: embed the query, search the graph, score the candidates.

use serde::Serialize;

use crate::embed::{EmbedPurpose, EmbeddingProvider};
use crate::error::{IndexError, IndexResult};
use crate::io::normalize_query;
use crate::vector::{Distances, VectorError, VectorIndex};

/// One ranked match.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    /// File identity as stored
    pub key: String,
    #[serde(skip_serializing)]
    pub vector: Vec<f32>,
    /// Exact distances to the query vector
    pub distances: Distances,
}

/// Embed `text` as a query.
///
/// Surrounding whitespace is trimmed; an empty query is a usage error.
pub fn embed_query(provider: &dyn EmbeddingProvider, text: &str) -> IndexResult<Vec<f32>> {
    let query = normalize_query(text)?;
    let embedding = provider.embed(&query, EmbedPurpose::Query)?;
    tracing::debug!(
        "embedded query with {} in {}ms ({} tokens)",
        provider.name(),
        embedding.meta.elapsed.as_millis(),
        embedding.meta.tokens
    );
    Ok(embedding.vector)
}

/// Read-only k-NN over a finished graph.
#[derive(Debug)]
pub struct QueryEngine<'a, V: VectorIndex> {
    index: &'a V,
}

impl<'a, V: VectorIndex> QueryEngine<'a, V> {
    pub fn new(index: &'a V) -> Self {
        Self { index }
    }

    /// Top `k` matches for `query`, nearest first.
    ///
    /// Scores are recomputed exactly for each candidate the graph returns.
    /// An empty query or one whose dimension differs from the graph is an
    /// error, so a failed search is never reported as "no matches".
    pub fn search(&self, query: &[f32], k: usize) -> IndexResult<Vec<QueryResult>> {
        if query.is_empty() {
            return Err(IndexError::Usage("query vector is empty".to_string()));
        }
        self.index
            .search(query, k)?
            .into_iter()
            .map(|(key, vector)| -> IndexResult<QueryResult> {
                let distances = Distances::between(query, &vector).ok_or(
                    VectorError::DimensionMismatch {
                        expected: query.len(),
                        actual: vector.len(),
                    },
                )?;
                Ok(QueryResult {
                    key,
                    vector,
                    distances,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embed::{Embedding, EmbeddingError, EmbeddingMeta};
    use crate::vector::HnswIndex;
    use parking_lot::Mutex;
    use std::time::Duration;

    struct EchoProvider {
        seen: Mutex<Vec<(String, EmbedPurpose)>>,
    }

    impl EmbeddingProvider for EchoProvider {
        fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Embedding, EmbeddingError> {
            self.seen.lock().push((text.to_string(), purpose));
            Ok(Embedding {
                vector: vec![1.0, 0.0],
                meta: EmbeddingMeta {
                    tokens: 1,
                    elapsed: Duration::ZERO,
                    provider: "echo".to_string(),
                    model: "echo".to_string(),
                },
            })
        }

        fn name(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_embed_query_trims_and_uses_query_purpose() {
        let provider = EchoProvider {
            seen: Mutex::new(Vec::new()),
        };
        let vector = embed_query(&provider, "  open a socket\n").unwrap();
        assert_eq!(vector, vec![1.0, 0.0]);
        assert_eq!(
            provider.seen.lock().as_slice(),
            &[("open a socket".to_string(), EmbedPurpose::Query)]
        );
    }

    #[test]
    fn test_empty_query_is_usage_error() {
        let provider = EchoProvider {
            seen: Mutex::new(Vec::new()),
        };
        let err = embed_query(&provider, "   ").unwrap_err();
        assert!(matches!(err, IndexError::Usage(_)));
        assert!(provider.seen.lock().is_empty());
    }

    #[test]
    fn test_search_ranks_and_scores() {
        let mut index = HnswIndex::default();
        index.add("far.go", vec![0.0, 1.0]).unwrap();
        index.add("near.go", vec![1.0, 0.1]).unwrap();
        index.add("exact.go", vec![2.0, 0.0]).unwrap();

        let engine = QueryEngine::new(&index);
        let results = engine.search(&[1.0, 0.0], 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].key, "exact.go");
        assert_eq!(results[1].key, "near.go");
        assert!(results[0].distances.cosine.abs() < 1e-6);
        assert!((results[0].distances.euclidean - 1.0).abs() < 1e-6);
        assert!((results[0].distances.sum_squared - 1.0).abs() < 1e-6);
        assert!(results[0].distances.cosine <= results[1].distances.cosine);
    }

    #[test]
    fn test_search_empty_graph_and_zero_k() {
        let index = HnswIndex::default();
        let engine = QueryEngine::new(&index);
        assert!(engine.search(&[1.0, 0.0], 5).unwrap().is_empty());

        let mut index = HnswIndex::default();
        index.add("a.go", vec![1.0, 0.0]).unwrap();
        let engine = QueryEngine::new(&index);
        assert!(engine.search(&[1.0, 0.0], 0).unwrap().is_empty());
        assert!(matches!(engine.search(&[], 1), Err(IndexError::Usage(_))));
    }

    #[test]
    fn test_search_with_other_model_dimension_fails() {
        let mut index = HnswIndex::default();
        index.add("a.go", vec![1.0, 0.0, 0.0]).unwrap();
        let engine = QueryEngine::new(&index);

        let err = engine.search(&[1.0, 0.0], 5).unwrap_err();
        assert!(matches!(
            err,
            IndexError::Vector(VectorError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }
}
