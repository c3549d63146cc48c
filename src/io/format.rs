//! Format definitions for CLI output.
//!
//! Query results are printed either as aligned text lines or as one JSON
//! document; errors in JSON mode use the same envelope.

use crate::error::IndexError;
use crate::indexing::IndexStats;
use crate::io::exit_code::ExitCode;
use crate::retrieve::QueryResult;
use serde::Serialize;
use std::io::Write;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text (default)
    Text,
    /// JSON for tool integration
    Json,
}

impl OutputFormat {
    /// Create format from JSON flag.
    #[must_use]
    pub fn from_json_flag(json: bool) -> Self {
        if json { Self::Json } else { Self::Text }
    }

    /// Check if format is JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        matches!(self, Self::Json)
    }
}

/// The document printed by `--json`.
#[derive(Debug, Serialize)]
pub struct QueryReport<'a> {
    pub query: &'a str,
    pub results: &'a [QueryResult],
    pub stats: &'a IndexStats,
}

/// Error envelope for JSON mode.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Always "error"
    pub status: String,
    /// Stable code, e.g. "USAGE_ERROR"
    pub code: String,
    pub message: String,
    pub suggestions: Vec<String>,
    pub exit_code: u8,
}

impl ErrorResponse {
    /// Create an error response from IndexError.
    pub fn from_error(error: &IndexError) -> Self {
        Self {
            status: "error".to_string(),
            code: error.status_code(),
            message: error.to_string(),
            suggestions: error
                .recovery_suggestions()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            exit_code: ExitCode::from_error(error) as u8,
        }
    }
}

/// One text line per result, nearest first.
pub fn format_result_line(result: &QueryResult) -> String {
    let d = &result.distances;
    format!(
        "{}  cosine={:.6} euclidean={:.6} sum_sq={:.6}",
        result.key, d.cosine, d.euclidean, d.sum_squared
    )
}

/// Write query results to `out` in `format`.
pub fn write_results<W: Write>(
    out: &mut W,
    format: OutputFormat,
    query: &str,
    results: &[QueryResult],
    stats: &IndexStats,
) -> std::io::Result<()> {
    match format {
        OutputFormat::Text => {
            if results.is_empty() {
                writeln!(out, "No matches for '{query}'")?;
            }
            for result in results {
                writeln!(out, "{}", format_result_line(result))?;
            }
        }
        OutputFormat::Json => {
            let report = QueryReport {
                query,
                results,
                stats,
            };
            serde_json::to_writer_pretty(&mut *out, &report)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
