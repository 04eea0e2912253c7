//! Error types for statementq operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type used throughout statementq.
pub type StatementResult<T> = Result<T, StatementError>;

/// Main error type for statementq operations.
#[derive(Error, Debug)]
pub enum StatementError {
    /// The request handed to `enqueue` is malformed
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the request
        message: String,
    },

    /// The queue was closed and no longer accepts requests
    #[error("Invoice queue is closed")]
    QueueClosed,

    /// The queue reached its configured capacity
    #[error("Invoice queue is full (max size: {max_size})")]
    QueueFull {
        /// Configured capacity
        max_size: usize,
    },

    /// Statement generation failed
    #[error("Statement generation failed: {message}")]
    Generation {
        /// Error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The same play id appears more than once in a request
    #[error("Play '{play_id}' appears more than once in the request")]
    DuplicatePlay {
        /// The repeated play id
        play_id: uuid::Uuid,
    },

    /// Processing a single request panicked
    #[error("Processing panicked: {message}")]
    Panicked {
        /// Panic payload, when it was a string
        message: String,
    },

    /// The processor task ended abnormally before draining the queue
    #[error("Statement processor failed with {pending} requests left: {message}")]
    ProcessorFailed {
        /// Why the task ended
        message: String,
        /// Requests still queued when it ended
        pending: usize,
    },

    /// Filesystem error while preparing or writing output
    #[error("I/O error on '{}': {source}", .path.display())]
    Io {
        /// Path involved in the failed operation
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Operation timed out
    #[error("Operation timed out after {timeout_secs} seconds")]
    Timeout {
        /// Timeout duration in seconds
        timeout_secs: u64,
    },

    /// The service is already running
    #[error("Statement service is already running")]
    AlreadyRunning,

    /// The service is not running
    #[error("Statement service is not running")]
    NotRunning,

    /// The service was stopped and cannot be started again
    #[error("Statement service has been shut down")]
    ShutDown,
}

impl StatementError {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a generation error wrapping the generator's failure
    pub fn generation<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Generation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an I/O error for the given path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a panic error from a caught panic payload
    pub fn panicked(payload: &(dyn std::any::Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        Self::Panicked { message }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_io_error_mentions_path() {
        let err = StatementError::io(
            "/tmp/out/acme.json",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let message = err.to_string();
        assert!(message.contains("/tmp/out/acme.json"));
        assert!(message.contains("denied"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_generation_error_keeps_source() {
        let cause = std::io::Error::other("renderer exploded");
        let err = StatementError::generation("rendering failed", cause);
        assert_eq!(
            err.to_string(),
            "Statement generation failed: rendering failed"
        );
        assert_eq!(err.source().unwrap().to_string(), "renderer exploded");
    }

    #[test]
    fn test_panicked_extracts_payload() {
        let payload = std::panic::catch_unwind(|| -> u8 { panic!("disk on fire") }).unwrap_err();
        let err = StatementError::panicked(payload.as_ref());
        assert!(matches!(err, StatementError::Panicked { ref message } if message == "disk on fire"));

        let owned = format!("key {}", "B");
        let payload = std::panic::catch_unwind(move || -> u8 { panic!("{owned}") }).unwrap_err();
        let err = StatementError::panicked(payload.as_ref());
        assert_eq!(err.to_string(), "Processing panicked: key B");
    }
}
