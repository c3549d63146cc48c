//! Bounded queue liveness: every path is processed exactly once.

use crate::common::{CountingProvider, TestProject};
use codectx::indexing::Indexer;
use codectx::{EmbeddingStore, HnswIndex, VectorIndex};
use std::collections::HashSet;

fn run_with(workers: usize, capacity: usize, files: usize) {
    let project = TestProject::new();
    let paths: Vec<_> = (0..files)
        .map(|i| project.add_file(&format!("pkg{}/f{i}.go", i % 4), &format!("package p{i}\n")))
        .collect();

    let store = EmbeddingStore::open_in_memory().unwrap();
    let provider = CountingProvider::new();

    let (graph, stats) = Indexer::new(&store, &provider, HnswIndex::default())
        .with_workers(workers)
        .with_queue_capacity(capacity)
        .run(paths.clone())
        .unwrap();

    assert_eq!(stats.files_seen, files, "workers={workers} capacity={capacity}");
    assert_eq!(provider.calls(), files);
    assert_eq!(graph.len(), files);
    assert_eq!(store.len().unwrap(), files);

    // Each file's text was embedded exactly once
    let seen: HashSet<String> = provider.seen().into_iter().collect();
    assert_eq!(seen.len(), files);
}

#[test]
fn test_single_worker_small_queue() {
    run_with(1, 2, 25);
}

#[test]
fn test_three_workers_small_queue() {
    run_with(3, 2, 25);
}

#[test]
fn test_eight_workers_small_queue() {
    run_with(8, 5, 40);
}

#[test]
fn test_more_workers_than_files() {
    run_with(8, 1, 3);
}

#[test]
fn test_empty_input_finishes() {
    let store = EmbeddingStore::open_in_memory().unwrap();
    let provider = CountingProvider::new();
    let (graph, stats) = Indexer::new(&store, &provider, HnswIndex::default())
        .with_workers(4)
        .run(Vec::new())
        .unwrap();
    assert!(graph.is_empty());
    assert_eq!(stats.files_seen, 0);
}
