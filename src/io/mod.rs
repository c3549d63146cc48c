//! Input/Output handling for the CLI.
//!
//! This module provides:
//! - Positional argument and query prompt resolution
//! - Output formatting (text, JSON)
//! - Consistent exit codes

pub mod args;
pub mod exit_code;
pub mod format;

pub use args::{QuerySource, normalize_query, read_query, resolve_positionals};
pub use exit_code::ExitCode;
pub use format::{ErrorResponse, OutputFormat, write_results};
