//! Error types for zram-card-core.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the kernel tools or the settings file.
#[derive(Debug, Error)]
pub enum Error {
    /// Input data is invalid or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The external program could not be started (usually not installed).
    #[error("{program} is not available: {reason}")]
    ToolUnavailable {
        /// Program name.
        program: String,
        /// Reason reported by the OS.
        reason: String,
    },

    /// The external program ran but exited unsuccessfully.
    #[error("{program} failed (exit {status:?}): {diagnostic}")]
    ToolFailed {
        /// Program name.
        program: String,
        /// Exit code, `None` when killed by a signal.
        status: Option<i32>,
        /// Captured stderr, or stdout when stderr was empty.
        diagnostic: String,
    },

    /// The external program did not finish in time and was killed.
    #[error("{program} timed out after {timeout:?}")]
    Timeout {
        /// Program name.
        program: String,
        /// Timeout that was exceeded.
        timeout: Duration,
    },

    /// Tool output could not be parsed.
    #[error("malformed output: {0}")]
    MalformedOutput(String),

    /// Settings file could not be encoded.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error (filesystem, process plumbing).
    #[error("I/O error: {0}")]
    IoError(String),
}

impl Error {
    /// Text suitable for a user-facing failure message.
    ///
    /// For tool failures this is just the tool's own output, which is what the
    /// dashboard shows; other variants use their display form.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self {
            Self::ToolFailed { diagnostic, .. } if !diagnostic.is_empty() => diagnostic.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for zram-card operations.
pub type Result<T> = std::result::Result<T, Error>;
