//! Error types for logger-pipe.

use std::time::Duration;

use thiserror::Error;

/// Main error type for logger-pipe operations.
#[derive(Error, Debug)]
pub enum LoggerPipeError {
    /// The returns/logging pair (or a selector value) was rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The shell could not be started.
    #[error("failed to spawn shell: {0}")]
    Spawn(#[source] std::io::Error),

    /// The command ran and exited with a non-zero status.
    #[error("{message}")]
    CommandFailure {
        /// Message already written to the log.
        message: String,
        /// Every line captured before the process exited, in order.
        lines: Vec<String>,
        /// Exit code, `None` when the process was killed by a signal.
        exit_code: Option<i32>,
    },

    /// The command did not finish before its deadline.
    #[error("command timed out after {timeout:?}: {command}")]
    DeadlineExceeded {
        /// The command that was running.
        command: String,
        /// The configured deadline.
        timeout: Duration,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoggerPipeError {
    /// Captured lines attached to a command failure.
    pub fn lines(&self) -> Option<&[String]> {
        match self {
            Self::CommandFailure { lines, .. } => Some(lines),
            _ => None,
        }
    }

    /// Whether this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::DeadlineExceeded { .. })
    }
}

/// Convenience Result type for logger-pipe operations.
pub type Result<T> = std::result::Result<T, LoggerPipeError>;
