//! Operation-level errors.
//!
//! These abort a whole run before any entry is processed. Failures on a single
//! entry never become a `HousekeepError`; they are recorded in a
//! [`RunResult`](crate::run_result::RunResult) instead.

use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for housekeeping operations.
pub type Result<T> = std::result::Result<T, HousekeepError>;

/// Errors that abort an operation as a whole.
#[derive(Debug, Error)]
pub enum HousekeepError {
    /// The root or target path does not exist.
    #[error("path does not exist: {}", path.display())]
    NotFound { path: PathBuf },

    /// An argument was rejected before any work started.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// An I/O failure on the top-level path itself.
    #[error("I/O failure at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration could not be loaded or compiled.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A system command could not produce a usable result.
    #[error("command `{command}` failed: {reason}")]
    Command { command: String, reason: String },
}

impl HousekeepError {
    pub(crate) fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Returns true for the `NotFound` variant.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
