//! Index then query, the way the binary does it.

use crate::common::{CountingProvider, TestProject};
use codectx::indexing::{FileWalker, Indexer, prune_missing};
use codectx::{EmbeddingStore, HnswIndex, IndexError, QueryEngine, Settings, embed_query};

#[test]
fn test_query_returns_matching_file_first() {
    let project = TestProject::new();
    project.add_file("http.go", "serve http request handler");
    project.add_file("db.go", "open database connection pool");
    project.add_file("math.go", "0123456789 +-*/");

    let store = EmbeddingStore::open(project.db_path()).unwrap();
    let provider = CountingProvider::new();

    let query = embed_query(&provider, "  serve http request handler\n").unwrap();
    let settings = Settings::default();
    let paths = FileWalker::new(&settings.indexing)
        .walk(project.path())
        .unwrap();
    let (graph, _) = Indexer::new(&store, &provider, HnswIndex::default())
        .with_query(query.clone())
        .run(paths)
        .unwrap();

    let results = QueryEngine::new(&graph).search(&query, 2).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].key.ends_with("http.go"));
    assert!(results[0].distances.cosine.abs() < 1e-5);
    assert!(results[0].distances.cosine <= results[1].distances.cosine);
}

#[test]
fn test_limit_larger_than_graph() {
    let project = TestProject::new();
    project.add_file("only.go", "package only");

    let store = EmbeddingStore::open_in_memory().unwrap();
    let provider = CountingProvider::new();
    let settings = Settings::default();
    let paths = FileWalker::new(&settings.indexing)
        .walk(project.path())
        .unwrap();
    let (graph, _) = Indexer::new(&store, &provider, HnswIndex::default())
        .run(paths)
        .unwrap();

    let query = embed_query(&provider, "package").unwrap();
    let results = QueryEngine::new(&graph).search(&query, 10).unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn test_empty_query_rejected_before_provider_call() {
    let provider = CountingProvider::new();
    let err = embed_query(&provider, "\n").unwrap_err();
    assert!(matches!(err, IndexError::Usage(_)));
    assert_eq!(provider.calls(), 0);
}

#[test]
fn test_prune_removes_deleted_files() {
    let project = TestProject::new();
    let keep = project.add_file("keep.go", "package keep");
    let drop = project.add_file("drop.go", "package drop");

    let store = EmbeddingStore::open(project.db_path()).unwrap();
    let provider = CountingProvider::new();
    let settings = Settings::default();
    let paths = FileWalker::new(&settings.indexing)
        .walk(project.path())
        .unwrap();
    Indexer::new(&store, &provider, HnswIndex::default())
        .run(paths)
        .unwrap();
    assert_eq!(store.len().unwrap(), 2);

    std::fs::remove_file(&drop).unwrap();
    let removed = prune_missing(&store, project.path()).unwrap();

    assert_eq!(removed, 1);
    let remaining = store.get_all().unwrap();
    assert!(remaining.contains_key(&*keep.to_string_lossy()));
}
