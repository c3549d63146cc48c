//! File system walker for discovering files to index
//!
//! This module provides directory traversal with support for:
//! - .gitignore rules (no git repository required)
//! - A custom per-directory ignore file (`.astignore` by default)
//! - Extra exclude globs from configuration
//! - Hidden file handling

use crate::config::IndexingConfig;
use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use std::path::{Path, PathBuf};

/// Walks directories to find files to index
#[derive(Debug, Clone)]
pub struct FileWalker {
    ignore_file: String,
    ignore_patterns: Vec<String>,
    excluded: Vec<PathBuf>,
}

impl FileWalker {
    /// Create a new file walker from the indexing settings
    pub fn new(config: &IndexingConfig) -> Self {
        Self {
            ignore_file: config.ignore_file.clone(),
            ignore_patterns: config.ignore_patterns.clone(),
            excluded: Vec::new(),
        }
    }

    /// Never yield `path` (e.g. the embeddings database and its WAL files).
    pub fn exclude(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let canonical = path.canonicalize().unwrap_or(path);
        self.excluded.push(canonical);
        self
    }

    /// Walk a directory and return an iterator of files to index
    pub fn walk(
        &self,
        root: &Path,
    ) -> Result<impl Iterator<Item = PathBuf> + use<>, ignore::Error> {
        let overrides = self.build_overrides(root)?;
        let mut builder = WalkBuilder::new(root);

        builder
            .hidden(true) // Skip hidden files and directories
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .max_depth(None)
            .require_git(false) // Allow gitignore to work in non-git directories
            .overrides(overrides);

        if !self.ignore_file.is_empty() {
            builder.add_custom_ignore_filename(&self.ignore_file);
        }

        let excluded = self.excluded_under(root);
        Ok(builder
            .build()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(target: "walker", "skipping unreadable entry: {e}");
                    None
                }
            })
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .map(|entry| entry.into_path())
            .filter(move |path| !is_excluded(path, &excluded)))
    }

    /// Overrides whitelist by default; a leading `!` turns each glob into an exclude.
    fn build_overrides(&self, root: &Path) -> Result<Override, ignore::Error> {
        let mut builder = OverrideBuilder::new(root);
        for pattern in &self.ignore_patterns {
            let pattern = pattern.trim();
            if pattern.is_empty() {
                continue;
            }
            match pattern.strip_prefix('!') {
                Some(include) => builder.add(include)?,
                None => builder.add(&format!("!{pattern}"))?,
            };
        }
        builder.build()
    }

    /// Excluded paths re-expressed under `root` as spelled, so walked paths
    /// compare lexically without touching the file system.
    fn excluded_under(&self, root: &Path) -> Vec<PathBuf> {
        let canonical_root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
        self.excluded
            .iter()
            .map(|ex| match ex.strip_prefix(&canonical_root) {
                Ok(relative) => root.join(relative),
                Err(_) => ex.clone(),
            })
            .collect()
    }
}

/// Matches the excluded file itself and its SQLite siblings (`-wal`, `-shm`, `-journal`).
fn is_excluded(path: &Path, excluded: &[PathBuf]) -> bool {
    if excluded.is_empty() {
        return false;
    }
    let candidate = path.as_os_str().to_string_lossy();
    excluded.iter().any(|ex| {
        let ex = ex.as_os_str().to_string_lossy();
        candidate == ex
            || candidate
                .strip_prefix(&*ex)
                .is_some_and(|suffix| matches!(suffix, "-wal" | "-shm" | "-journal"))
    })
}
