//! Incremental indexing pipeline.
//!
//! A single producer (the calling thread) feeds file paths into a bounded
//! queue; a fixed pool of scoped worker threads drains it. For every file a
//! worker decides whether the stored embedding is still valid (same content
//! fingerprint) or whether the file must be embedded again, writes through to
//! the [`RecordStore`] and adds the vector to the in-memory graph.
//!
//! The pool shuts down when the producer drops its sender: `recv` keeps
//! yielding buffered paths until the queue is empty and only then reports
//! disconnection, so no path is lost.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crossbeam_channel::{Receiver, bounded};
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::Dispatch;

use crate::embed::{EmbedPurpose, EmbeddingProvider};
use crate::error::{IndexError, IndexResult};
use crate::indexing::fingerprint::fingerprint;
use crate::indexing::stats::{FileOutcome, IndexStats};
use crate::storage::{EmbeddingStore, RecordStore, StorageError};
use crate::vector::{Distances, HnswIndex, VectorIndex};

/// Default number of worker threads
pub const DEFAULT_WORKERS: usize = 4;

/// Default capacity of the path queue
pub const DEFAULT_QUEUE_CAPACITY: usize = 5;

/// Orchestrates one indexing run.
///
/// `run` consumes the indexer and hands back the graph only after every
/// worker has joined, so a partially built graph is never searchable.
pub struct Indexer<'a, V: VectorIndex = HnswIndex> {
    store: &'a dyn RecordStore,
    provider: &'a dyn EmbeddingProvider,
    graph: Mutex<V>,
    query: Option<Vec<f32>>,
    workers: usize,
    queue_capacity: usize,
    dispatch: Dispatch,
    cancel: CancellationToken,
}

impl<'a, V: VectorIndex> Indexer<'a, V> {
    /// Create an indexer writing to `store` and feeding `graph`.
    ///
    /// Workers log through the dispatcher that is current on the calling
    /// thread unless [`with_dispatch`](Self::with_dispatch) overrides it.
    pub fn new(store: &'a dyn RecordStore, provider: &'a dyn EmbeddingProvider, graph: V) -> Self {
        Self {
            store,
            provider,
            graph: Mutex::new(graph),
            query: None,
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            dispatch: tracing::dispatcher::get_default(Dispatch::clone),
            cancel: CancellationToken::new(),
        }
    }

    /// Number of worker threads (at least one).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Capacity of the bounded path queue (at least one).
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    /// Query vector used for the per-file distance diagnostics.
    ///
    /// Its length is also the dimension a stored vector must have to be
    /// reused; records from another model are embedded again.
    #[must_use]
    pub fn with_query(mut self, query: Vec<f32>) -> Self {
        self.query = Some(query);
        self
    }

    /// Log through `dispatch` on every worker thread.
    #[must_use]
    pub fn with_dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = dispatch;
        self
    }

    /// Share a cancellation token with the caller.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that stops the run when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Index every path from `paths` and return the finished graph.
    ///
    /// Per-file failures are counted in the returned stats. A store
    /// inconsistency cancels the run and is returned as the error.
    pub fn run<I>(self, paths: I) -> IndexResult<(V, IndexStats)>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut stats = IndexStats::new();
        let (sender, receiver) = bounded::<PathBuf>(self.queue_capacity);

        tracing::debug!(
            target: "indexer",
            "starting {} workers, queue capacity {}",
            self.workers,
            self.queue_capacity
        );

        let outcomes: Vec<IndexResult<IndexStats>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..self.workers)
                .map(|worker_id| {
                    let receiver = receiver.clone();
                    let this = &self;
                    scope.spawn(move || this.worker_loop(worker_id, receiver))
                })
                .collect();
            drop(receiver);

            for path in paths {
                if self.cancel.is_cancelled() {
                    tracing::debug!(target: "indexer", "run cancelled, producer stopping");
                    break;
                }
                // Blocks while the queue is full
                if sender.send(path).is_err() {
                    break;
                }
            }
            drop(sender);

            handles
                .into_iter()
                .map(|handle| match handle.join() {
                    Ok(result) => result,
                    Err(panic) => std::panic::resume_unwind(panic),
                })
                .collect()
        });

        let mut failure = None;
        for outcome in outcomes {
            match outcome {
                Ok(worker_stats) => stats.merge(worker_stats),
                Err(e) => {
                    failure.get_or_insert(e);
                }
            }
        }
        stats.stop_timing();

        if let Some(e) = failure {
            return Err(e);
        }
        if self.cancel.is_cancelled() {
            return Err(IndexError::Cancelled);
        }

        tracing::info!(
            target: "indexer",
            "indexed {} files ({} reused, {} embedded, {} failed) in {}ms",
            stats.files_seen,
            stats.files_reused,
            stats.files_embedded,
            stats.files_failed,
            stats.elapsed.as_millis()
        );

        Ok((self.graph.into_inner(), stats))
    }

    fn worker_loop(&self, worker_id: usize, receiver: Receiver<PathBuf>) -> IndexResult<IndexStats> {
        let _guard = tracing::dispatcher::set_default(&self.dispatch);
        let mut stats = IndexStats::default();
        let mut failure = None;

        for path in receiver.iter() {
            // Drain without processing once cancelled
            if self.cancel.is_cancelled() {
                continue;
            }
            if let Err(e) = self.process_file(&path, &mut stats) {
                tracing::error!(target: "indexer", "worker {worker_id}: {e}, cancelling run");
                self.cancel.cancel();
                failure = Some(e);
            }
        }

        tracing::trace!(target: "indexer", "worker {worker_id} done after {} files", stats.files_seen);
        match failure {
            Some(e) => Err(e),
            None => Ok(stats),
        }
    }

    /// Run the reuse-or-embed decision for one file and count its outcome.
    ///
    /// Read, embedding, storage and graph failures are logged, recorded in
    /// `stats` and reported as [`FileOutcome::Failed`]. Only a store
    /// inconsistency is returned as an error.
    pub fn process_file(&self, path: &Path, stats: &mut IndexStats) -> IndexResult<FileOutcome> {
        let start = Instant::now();
        let id = path.to_string_lossy();

        let outcome = match self.index_one(path, &id, start) {
            Ok(outcome) => outcome,
            Err(e @ IndexError::Consistency { .. }) => return Err(e),
            Err(e) => {
                tracing::error!(target: "indexer", "skipping {id}: {e}");
                stats.add_error(path.to_path_buf(), e.to_string());
                FileOutcome::Failed
            }
        };
        stats.record(&outcome);
        Ok(outcome)
    }

    fn index_one(&self, path: &Path, id: &str, start: Instant) -> IndexResult<FileOutcome> {
        let bytes = std::fs::read(path).map_err(|source| IndexError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let hash = fingerprint(&bytes);

        if self.store.match_hash(id, hash.as_str())? {
            if let Some(vector) = self.reusable_vector(id)? {
                self.log_file(id, "reused", &vector, None, start);
                self.graph.lock().add(id, vector)?;
                return Ok(FileOutcome::Reused);
            }
        }

        let text = String::from_utf8_lossy(&bytes);
        let embedding = self.provider.embed(&text, EmbedPurpose::Document)?;
        self.store.upsert(id, hash.as_str(), &embedding.vector)?;

        let meta = embedding.meta;
        self.log_file(id, "embedded", &embedding.vector, Some((meta.elapsed, meta.tokens)), start);
        self.graph.lock().add(id, embedding.vector)?;

        Ok(FileOutcome::Embedded {
            tokens: meta.tokens,
            elapsed: meta.elapsed,
        })
    }

    /// Stored vector for `id` if it can stand in for a fresh embedding.
    ///
    /// A corrupt blob or a dimension other than the expected one is a cache
    /// miss. A missing record after a hash match is an inconsistency.
    fn reusable_vector(&self, id: &str) -> IndexResult<Option<Vec<f32>>> {
        let record = match self.store.fetch(id) {
            Ok(Some(record)) => record,
            Ok(None) => return Err(IndexError::Consistency { id: id.to_string() }),
            Err(e @ StorageError::Corrupt { .. }) => {
                tracing::warn!(target: "indexer", "re-embedding {id}: {e}");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let expected = self.expected_dimension();
        if expected.is_some_and(|d| d != record.vector.len()) {
            tracing::debug!(
                target: "indexer",
                "re-embedding {id}: stored dimension {} differs from {expected:?}",
                record.vector.len()
            );
            return Ok(None);
        }
        Ok(Some(record.vector))
    }

    /// The query's dimension, or the graph's once it holds a vector.
    fn expected_dimension(&self) -> Option<usize> {
        match &self.query {
            Some(query) => Some(query.len()),
            None => self.graph.lock().dimension(),
        }
    }

    fn log_file(
        &self,
        id: &str,
        outcome: &str,
        vector: &[f32],
        embedded: Option<(std::time::Duration, usize)>,
        start: Instant,
    ) {
        let distances = self
            .query
            .as_deref()
            .and_then(|q| Distances::between(q, vector));
        let (embed_ms, tokens) = embedded.map_or((0, 0), |(d, t)| (d.as_millis(), t));
        tracing::debug!(
            target: "indexer",
            path = id,
            outcome,
            cosine = distances.map(|d| d.cosine),
            euclidean = distances.map(|d| d.euclidean),
            embed_ms = embed_ms as u64,
            tokens,
            total_ms = start.elapsed().as_millis() as u64,
            "processed file"
        );
    }
}

/// Delete stored records under `root` whose files no longer exist.
///
/// Returns the number of records removed.
pub fn prune_missing(store: &EmbeddingStore, root: &Path) -> IndexResult<usize> {
    let mut removed = 0;
    for id in store.get_all()?.into_keys() {
        let path = Path::new(&id);
        if path.starts_with(root) && !path.exists() {
            store.delete(&id)?;
            tracing::debug!(target: "indexer", "pruned {id}");
            removed += 1;
        }
    }
    Ok(removed)
}
