use crate::tools::InvocationMode;
use std::time::Duration;
use thiserror::Error;

/// Error kinds surfaced by the agent core and its tools
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (permanent failures)
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // I/O errors (potentially transient)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors (usually permanent)
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    // Network errors (transient - the executor retries these)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Registry lookup failures (permanent - surfaced to the caller as-is)
    #[error("Tool '{name}' is not registered")]
    ToolNotFound { name: String },

    #[error("Tool '{tool}' has no {mode} entry point")]
    Unimplemented { tool: String, mode: InvocationMode },

    // Terminal executor outcomes, produced once the retry budget is spent
    #[error("{operation} did not complete within {timeout:?}, gave up after {attempts} attempts")]
    TimeoutExceeded {
        operation: String,
        timeout: Duration,
        attempts: u32,
    },

    #[error("{operation} failed after {attempts} attempts: {message}")]
    OperationFailed {
        operation: String,
        message: String,
        attempts: u32,
    },

    // Client errors (permanent - don't retry)
    #[error("Invalid input: {field} - {reason}")]
    InvalidInput { field: String, reason: String },

    // Parse errors
    #[error("Parse error in {context}: {message}")]
    Parse { context: String, message: String },

    // Upstream service errors
    #[error("Upstream service error: {service} - {reason}")]
    Upstream { service: String, reason: String },

    // Runtime task failures (panicked or aborted workers)
    #[error("Background task failed: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl Error {
    /// Attempt count carried by terminal executor errors.
    pub fn attempts(&self) -> Option<u32> {
        match self {
            Self::TimeoutExceeded { attempts, .. } | Self::OperationFailed { attempts, .. } => {
                Some(*attempts)
            }
            _ => None,
        }
    }

    /// Whether this error came from the executor exhausting its retry budget.
    pub fn is_terminal_operation_error(&self) -> bool {
        matches!(
            self,
            Self::TimeoutExceeded { .. } | Self::OperationFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
