//! Logging setup.
//!
//! statementq reports through `tracing`; processing failures are `error`
//! events carrying `customer`, `invoice_id` and `error` fields. Hosts that do
//! not install their own subscriber can call [`init`].

use crate::config::LoggingConfig;
use crate::error::{StatementError, StatementResult};

/// Install a global `tracing-subscriber` fmt subscriber from `config`.
///
/// Fails if a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> StatementResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(config.level))
        .with_target(config.include_targets);

    let result = if config.json_format {
        builder.json().try_init()
    } else {
        builder.with_ansi(config.colored).try_init()
    };

    result.map_err(|e| StatementError::config(format!("failed to install tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_init_only_once() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            colored: false,
            ..Default::default()
        };

        assert!(init(&config).is_ok());
        assert!(matches!(init(&config), Err(StatementError::Config { .. })));
    }
}
