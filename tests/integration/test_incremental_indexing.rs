//! Change detection across runs against a persistent store.

use crate::common::{CountingProvider, TestProject};
use codectx::indexing::{FileWalker, Indexer};
use codectx::{EmbeddingStore, HnswIndex, IndexStats, Settings, VectorIndex, fingerprint};
use std::path::Path;

fn id(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn index_project(
    project: &TestProject,
    store: &EmbeddingStore,
    provider: &CountingProvider,
) -> (HnswIndex, IndexStats) {
    let settings = Settings::default();
    let walker = FileWalker::new(&settings.indexing).exclude(project.db_path());
    let paths = walker.walk(project.path()).unwrap();
    Indexer::new(store, provider, HnswIndex::default())
        .with_workers(3)
        .run(paths)
        .unwrap()
}

#[test]
fn test_unchanged_second_run_makes_no_provider_calls() {
    let project = TestProject::new();
    project.add_file("src/a.go", "package a\nfunc A() {}\n");
    project.add_file("src/b.go", "package b\nfunc B() {}\n");
    project.add_file("README.md", "# demo\n");

    let store = EmbeddingStore::open(project.db_path()).unwrap();
    let provider = CountingProvider::new();

    let (graph, stats) = index_project(&project, &store, &provider);
    assert_eq!(provider.calls(), 3);
    assert_eq!(stats.files_embedded, 3);
    assert_eq!(graph.len(), 3);

    provider.reset();
    let (graph, stats) = index_project(&project, &store, &provider);
    assert_eq!(provider.calls(), 0);
    assert_eq!(stats.files_reused, 3);
    assert_eq!(stats.files_embedded, 0);
    assert_eq!(graph.len(), 3);
}

#[test]
fn test_identical_files_share_fingerprint_but_not_id() {
    let project = TestProject::new();
    let one = project.add_file("one.go", "package same\n");
    let two = project.add_file("two.go", "package same\n");

    let store = EmbeddingStore::open(project.db_path()).unwrap();
    let provider = CountingProvider::new();
    index_project(&project, &store, &provider);

    let records = store.get_all().unwrap();
    let r1 = &records[&id(&one)];
    let r2 = &records[&id(&two)];
    assert_eq!(r1.hash, r2.hash);
    assert_eq!(r1.hash, fingerprint(b"package same\n").to_string());
    assert_ne!(r1.id, r2.id);

    // Changing one of them re-embeds exactly that file
    project.add_file("two.go", "package different\n");
    provider.reset();
    let (_, stats) = index_project(&project, &store, &provider);

    assert_eq!(provider.calls(), 1);
    assert_eq!(provider.seen(), vec!["package different\n".to_string()]);
    assert_eq!(stats.files_reused, 1);
    assert_eq!(stats.files_embedded, 1);

    let records = store.get_all().unwrap();
    assert_eq!(records[&id(&one)].hash, r1.hash);
    assert_eq!(
        records[&id(&two)].hash,
        fingerprint(b"package different\n").to_string()
    );
    assert_eq!(
        records[&id(&two)].vector,
        CountingProvider::vector_for("package different\n")
    );
}

#[test]
fn test_provider_failure_leaves_prior_record_intact() {
    let project = TestProject::new();
    let path = project.add_file("svc.go", "package svc // v1\n");

    let store = EmbeddingStore::open(project.db_path()).unwrap();
    let provider = CountingProvider::new();
    index_project(&project, &store, &provider);

    let id = path.to_string_lossy().into_owned();
    let before = store.get(&[id.as_str()]).unwrap().pop().unwrap();

    project.add_file("svc.go", "package svc // v2\n");
    provider.fail_on("package svc // v2\n");
    let (graph, stats) = index_project(&project, &store, &provider);

    assert_eq!(stats.files_failed, 1);
    assert_eq!(stats.errors.len(), 1);
    assert!(graph.is_empty());

    let after = store.get(&[id.as_str()]).unwrap().pop().unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_store_survives_reopen_between_runs() {
    let project = TestProject::new();
    project.add_file("lib.go", "package lib\n");
    let provider = CountingProvider::new();

    {
        let store = EmbeddingStore::open(project.db_path()).unwrap();
        index_project(&project, &store, &provider);
    }
    provider.reset();

    let store = EmbeddingStore::open(project.db_path()).unwrap();
    let (_, stats) = index_project(&project, &store, &provider);
    assert_eq!(provider.calls(), 0);
    assert_eq!(stats.files_reused, 1);
}

#[test]
fn test_corrupt_stored_vector_heals_on_next_run() {
    let project = TestProject::new();
    let path = project.add_file("cfg.go", "package cfg\n");
    let provider = CountingProvider::new();

    let store = EmbeddingStore::open(project.db_path()).unwrap();
    index_project(&project, &store, &provider);

    // Truncate the blob behind the store's back, keeping the hash
    let conn = rusqlite::Connection::open(project.db_path()).unwrap();
    conn.execute(
        "UPDATE embeddings SET embedding = x'0000803f00' WHERE id = ?1",
        [id(&path)],
    )
    .unwrap();
    drop(conn);

    provider.reset();
    let (graph, stats) = index_project(&project, &store, &provider);
    assert_eq!(stats.files_failed, 0);
    assert_eq!(stats.files_embedded, 1);
    assert_eq!(provider.calls(), 1);
    assert_eq!(graph.len(), 1);

    provider.reset();
    let (_, stats) = index_project(&project, &store, &provider);
    assert_eq!(stats.files_reused, 1);
    assert_eq!(provider.calls(), 0);
}
