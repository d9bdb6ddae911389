//! Tracing subscriber initialisation
//!
//! Installs a global `fmt` subscriber shaped by [`LoggingConfig`]. The
//! `RUST_LOG` variable, when set, replaces the configured filter.

use tg_shared::config::{LogFormat, LoggingConfig};
use tracing_subscriber::EnvFilter;

use crate::InfrastructureError;

/// Parse a filter expression such as `info,tg_core=debug`
pub fn env_filter(directives: &str) -> Result<EnvFilter, InfrastructureError> {
    EnvFilter::try_new(directives)
        .map_err(|e| InfrastructureError::Telemetry(format!("Invalid log filter '{}': {}", directives, e)))
}

/// Install the global subscriber
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), InfrastructureError> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => env_filter(&directives)?,
        _ => env_filter(&config.level)?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(config.colored)
        .with_file(config.source_location)
        .with_line_number(config.source_location)
        .with_target(true);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };

    installed.map_err(|e| InfrastructureError::Telemetry(e.to_string()))?;

    tracing::debug!(format = ?config.format, level = %config.level, "Tracing initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_filter_accepts_directives() {
        assert!(env_filter("info").is_ok());
        assert!(env_filter("warn,tg_core=debug,sqlx=warn").is_ok());
    }

    #[test]
    fn test_env_filter_rejects_unknown_level() {
        let result = env_filter("tg_core=loud");
        assert!(matches!(result, Err(InfrastructureError::Telemetry(_))));
    }

    #[test]
    fn test_second_init_fails() {
        let config = LoggingConfig {
            format: LogFormat::Compact,
            colored: false,
            ..LoggingConfig::default()
        };
        // The first call may or may not win the global slot.
        let _ = init_tracing(&config);
        assert!(init_tracing(&config).is_err());
    }
}
