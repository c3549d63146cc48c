//! Statistics for an indexing run

use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Maximum number of errors retained for reporting
const MAX_ERRORS: usize = 100;

/// What happened to a single file
#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    /// Content unchanged; stored vector reused without a provider call
    Reused,
    /// Content new or changed; embedded and written through to the store
    Embedded { tokens: usize, elapsed: Duration },
    /// Read, embedding or storage failure; any prior record is untouched
    Failed,
}

/// Statistics collected during indexing
#[derive(Debug, Default, Clone, Serialize)]
pub struct IndexStats {
    /// Number of files delivered to workers
    pub files_seen: usize,

    /// Files whose stored embedding was reused
    pub files_reused: usize,

    /// Files embedded in this run
    pub files_embedded: usize,

    /// Files that failed
    pub files_failed: usize,

    /// Tokens reported by the embedding provider
    pub tokens: usize,

    /// Time spent in provider calls, summed across workers
    #[serde(serialize_with = "serialize_millis")]
    pub embedding_time: Duration,

    /// Wall time of the run
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,

    /// Errors encountered (limited to first 100)
    pub errors: Vec<(PathBuf, String)>,

    /// Records removed by the prune pass
    pub pruned: usize,

    #[serde(skip)]
    start_time: Option<Instant>,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

impl IndexStats {
    /// Create new stats and start timing
    pub fn new() -> Self {
        Self {
            start_time: Some(Instant::now()),
            ..Default::default()
        }
    }

    /// Stop timing and record elapsed time
    pub fn stop_timing(&mut self) {
        if let Some(start) = self.start_time {
            self.elapsed = start.elapsed();
            self.start_time = None;
        }
    }

    /// Count the outcome of one file
    pub fn record(&mut self, outcome: &FileOutcome) {
        self.files_seen += 1;
        match outcome {
            FileOutcome::Reused => self.files_reused += 1,
            FileOutcome::Embedded { tokens, elapsed } => {
                self.files_embedded += 1;
                self.tokens += tokens;
                self.embedding_time += *elapsed;
            }
            FileOutcome::Failed => self.files_failed += 1,
        }
    }

    /// Remember an error (limited to first 100 errors)
    pub fn add_error(&mut self, path: PathBuf, error: String) {
        if self.errors.len() < MAX_ERRORS {
            self.errors.push((path, error));
        }
    }

    /// Fold a worker's local counters into this run's totals
    pub fn merge(&mut self, other: IndexStats) {
        self.files_seen += other.files_seen;
        self.files_reused += other.files_reused;
        self.files_embedded += other.files_embedded;
        self.files_failed += other.files_failed;
        self.tokens += other.tokens;
        self.embedding_time += other.embedding_time;
        self.pruned += other.pruned;
        let room = MAX_ERRORS.saturating_sub(self.errors.len());
        self.errors.extend(other.errors.into_iter().take(room));
    }

    /// Display the statistics in a human-readable format on stderr
    pub fn display(&self) {
        eprintln!("\nIndexing Complete:");
        eprintln!("  Files seen: {}", self.files_seen);
        eprintln!("  Reused: {}", self.files_reused);
        eprintln!("  Embedded: {}", self.files_embedded);
        eprintln!("  Failed: {}", self.files_failed);
        eprintln!("  Tokens: {}", self.tokens);
        if self.pruned > 0 {
            eprintln!("  Pruned: {}", self.pruned);
        }
        eprintln!("  Time elapsed: {}ms", self.elapsed.as_millis());

        if !self.errors.is_empty() {
            eprintln!("\nErrors (showing first {}):", self.errors.len().min(5));
            for (path, error) in &self.errors[..5.min(self.errors.len())] {
                eprintln!("  {}: {}", path.display(), error);
            }
            if self.files_failed > 5 {
                eprintln!("  ... and {} more errors", self.files_failed - 5);
            }
        }
    }
}
