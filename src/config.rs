//! Configuration types for statementq.
//!
//! Everything a host needs to wire the pipeline: where statements are written,
//! how the queue behaves under load, how the processor shuts down and how
//! logging is formatted.

use crate::error::{StatementError, StatementResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration for statementq.
///
/// # Examples
///
/// ```rust
/// use statementq::config::{StatementConfig, OutputConfig};
///
/// let config = StatementConfig {
///     output: OutputConfig::new("/var/lib/statements").with_extension("json"),
///     ..Default::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementConfig {
    /// Output directory settings
    pub output: OutputConfig,

    /// Invoice queue settings
    pub queue: QueueConfig,

    /// Background processor settings
    pub processor: ProcessorConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Where and how rendered statements are stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory that receives one file per customer
    pub directory: PathBuf,

    /// File extension appended to the customer name (without the dot)
    pub extension: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("statements"),
            extension: "json".to_string(),
        }
    }
}

impl OutputConfig {
    /// Output into the given directory with the default extension.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Default::default()
        }
    }

    /// Set the file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
}

/// Invoice queue configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum number of pending requests (0 = unlimited). When reached,
    /// enqueue is rejected with an error instead of blocking.
    pub max_queue_size: usize,
}

impl QueueConfig {
    /// Bound the queue to `max_size` pending requests.
    pub fn bounded(max_size: usize) -> Self {
        Self {
            max_queue_size: max_size,
        }
    }
}

/// What to do when a request lists the same play id twice.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum DuplicatePlayPolicy {
    /// Keep the later entry and log a warning
    #[default]
    LastWins,
    /// Fail the request
    Reject,
}

/// Background processor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    /// Time to wait for the queue to drain on stop (in seconds)
    pub shutdown_timeout_secs: u64,

    /// Handling of repeated play ids within one request
    pub duplicate_plays: DuplicatePlayPolicy,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout_secs: 30,
            duplicate_plays: DuplicatePlayPolicy::LastWins,
        }
    }
}

impl ProcessorConfig {
    /// Set the shutdown timeout.
    pub fn with_shutdown_timeout(mut self, timeout_secs: u64) -> Self {
        self.shutdown_timeout_secs = timeout_secs;
        self
    }

    /// Set the duplicate play policy.
    pub fn with_duplicate_plays(mut self, policy: DuplicatePlayPolicy) -> Self {
        self.duplicate_plays = policy;
        self
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: LogLevel,

    /// Enable structured JSON logging
    pub json_format: bool,

    /// Enable colored output (ignored if json_format is true)
    pub colored: bool,

    /// Include target module in logs
    pub include_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            json_format: false,
            colored: true,
            include_targets: false,
        }
    }
}

/// Log level enumeration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LogLevel {
    /// Trace level
    Trace,
    /// Debug level
    Debug,
    /// Info level
    Info,
    /// Warn level
    Warn,
    /// Error level
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Helper trait for converting durations in configuration.
pub trait DurationExt {
    /// Convert seconds to Duration
    fn secs(self) -> Duration;
}

impl DurationExt for u64 {
    fn secs(self) -> Duration {
        Duration::from_secs(self)
    }
}

impl StatementConfig {
    /// Create a new configuration optimized for development.
    pub fn development() -> Self {
        Self {
            processor: ProcessorConfig {
                shutdown_timeout_secs: 10,
                ..Default::default()
            },
            logging: LoggingConfig {
                level: LogLevel::Debug,
                colored: true,
                include_targets: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Create a new configuration optimized for production.
    pub fn production() -> Self {
        Self {
            output: OutputConfig::new("/var/lib/statementq/statements"),
            queue: QueueConfig::bounded(100_000),
            processor: ProcessorConfig {
                shutdown_timeout_secs: 120,
                duplicate_plays: DuplicatePlayPolicy::Reject,
            },
            logging: LoggingConfig {
                level: LogLevel::Info,
                json_format: true,
                colored: false,
                include_targets: false,
            },
        }
    }

    /// Create a configuration for testing, writing into `directory`.
    pub fn testing(directory: impl Into<PathBuf>) -> Self {
        Self {
            output: OutputConfig::new(directory),
            processor: ProcessorConfig {
                shutdown_timeout_secs: 5,
                ..Default::default()
            },
            logging: LoggingConfig {
                level: LogLevel::Debug,
                colored: false,
                include_targets: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> StatementResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| StatementError::config(format!("invalid configuration: {e}")))
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> StatementResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| StatementError::io(path, e))?;
        Self::from_json_str(&json)
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.output.directory.as_os_str().is_empty() {
            errors.push("Output directory must not be empty".to_string());
        }

        if self.output.extension.is_empty() {
            errors.push("Output extension must not be empty".to_string());
        }

        if self.output.extension.starts_with('.') {
            errors.push("Output extension must not start with a dot".to_string());
        }

        if self
            .output
            .extension
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '\0'))
        {
            errors.push("Output extension must not contain path separators".to_string());
        }

        if self.processor.shutdown_timeout_secs == 0 {
            errors.push("Shutdown timeout must be greater than 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
