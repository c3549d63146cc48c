#![allow(dead_code)]

use codectx::{EmbedPurpose, Embedding, EmbeddingError, EmbeddingMeta, EmbeddingProvider};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

pub struct TestProject {
    pub dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn add_file(&self, path: &str, content: &str) -> PathBuf {
        let file_path = self.dir.path().join(path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Database file outside the indexed tree.
    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join(".codectx").join("embeddings.db")
    }
}

/// Deterministic provider: a small bag-of-bytes vector per text.
///
/// Counts calls and remembers which texts it saw. Texts listed in
/// `failing` are rejected.
#[derive(Default)]
pub struct CountingProvider {
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
}

impl CountingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.calls.store(0, Ordering::SeqCst);
        self.seen.lock().clear();
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().clone()
    }

    pub fn fail_on(&self, text: &str) {
        self.failing.lock().insert(text.to_string());
    }

    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; 8];
        for (i, b) in text.bytes().enumerate() {
            v[(b as usize + i) % 8] += 1.0;
        }
        v[0] += 0.5;
        v
    }
}

impl EmbeddingProvider for CountingProvider {
    fn embed(&self, text: &str, _purpose: EmbedPurpose) -> Result<Embedding, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(text.to_string());
        if self.failing.lock().contains(text) {
            return Err(EmbeddingError::Status {
                provider: "counting".to_string(),
                status: 503,
                body: "unavailable".to_string(),
            });
        }
        Ok(Embedding {
            vector: Self::vector_for(text),
            meta: EmbeddingMeta {
                tokens: text.split_whitespace().count(),
                elapsed: Duration::from_micros(10),
                provider: "counting".to_string(),
                model: "bag-of-bytes".to_string(),
            },
        })
    }

    fn name(&self) -> &str {
        "counting"
    }

    fn model(&self) -> &str {
        "bag-of-bytes"
    }
}
