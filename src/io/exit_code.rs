//! Exit codes for CLI operations following Unix conventions.
//!
//! # Exit Code Semantics
//!
//! - `0`: Success (an empty result set is still success)
//! - `1`: General error, unspecified failure
//! - `2`: Usage error, invalid arguments or query
//! - `5`: File I/O error
//! - `6`: Setup or configuration error
//! - `7`: Embedding store inconsistency detected

use crate::error::{IndexError, SetupError};

/// Standard exit codes for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    /// Operation succeeded (code 0)
    Success = 0,

    /// Unspecified error occurred (code 1)
    GeneralError = 1,

    /// Invalid invocation (code 2), same as clap's usage errors
    UsageError = 2,

    /// File I/O error (code 5)
    IoError = 5,

    /// Provider, store or configuration unusable at startup (code 6)
    ConfigError = 6,

    /// Embedding store corruption detected (code 7)
    IndexCorrupted = 7,
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code as u8)
    }
}

impl ExitCode {
    /// Convert an `IndexError` to the appropriate exit code.
    pub fn from_error(error: &IndexError) -> Self {
        match error {
            IndexError::Usage(_) => ExitCode::UsageError,
            IndexError::FileRead { .. } | IndexError::Io { .. } => ExitCode::IoError,
            IndexError::Setup(SetupError::Store { .. }) => ExitCode::IoError,
            IndexError::Setup(_) => ExitCode::ConfigError,
            IndexError::Consistency { .. } => ExitCode::IndexCorrupted,
            IndexError::Storage(crate::storage::StorageError::Corrupt { .. }) => {
                ExitCode::IndexCorrupted
            }
            IndexError::Storage(crate::storage::StorageError::Io(_)) => ExitCode::IoError,
            _ => ExitCode::GeneralError,
        }
    }
}
