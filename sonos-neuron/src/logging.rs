//! Logging setup for hosts and the CLI
//!
//! Library code only emits `tracing` events. Whoever embeds the neuron picks
//! a [`LoggingMode`]; a host with its own subscriber picks none at all.

use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Environment variable selecting the logging mode
pub const LOG_MODE_ENV: &str = "SONOS_NEURON_LOG_MODE";
/// Environment variable overriding the filter, e.g. `sonos_neuron=debug`
pub const LOG_LEVEL_ENV: &str = "SONOS_NEURON_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber; events are dropped
    Silent,
    /// Compact stderr output at `info`
    Development,
    /// Verbose output with source locations at `debug`
    Debug,
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Install a global subscriber for `mode`
///
/// Fails when a global subscriber is already set.
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    match mode {
        LoggingMode::Silent => Ok(()),
        LoggingMode::Development => Registry::default()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .with(env_filter("info"))
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
        LoggingMode::Debug => Registry::default()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .pretty()
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(env_filter("debug"))
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string())),
    }
}

/// Install a subscriber for the mode named by `SONOS_NEURON_LOG_MODE`
///
/// `development` and `debug` are recognised; anything else is silent.
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    init_logging(mode_from_env(std::env::var(LOG_MODE_ENV).ok().as_deref()))
}

fn mode_from_env(value: Option<&str>) -> LoggingMode {
    match value {
        Some("development") => LoggingMode::Development,
        Some("debug") => LoggingMode::Debug,
        _ => LoggingMode::Silent,
    }
}

/// Filter from `SONOS_NEURON_LOG_LEVEL`, then `RUST_LOG`, then `default_level`
fn env_filter(default_level: &str) -> EnvFilter {
    let directives = std::env::var(LOG_LEVEL_ENV)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| default_level.to_string());
    EnvFilter::new(directives)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("development"), LoggingMode::Development)]
    #[case(Some("debug"), LoggingMode::Debug)]
    #[case(Some("silent"), LoggingMode::Silent)]
    #[case(Some("loud"), LoggingMode::Silent)]
    #[case(None, LoggingMode::Silent)]
    fn test_mode_from_env(#[case] value: Option<&str>, #[case] expected: LoggingMode) {
        assert_eq!(mode_from_env(value), expected);
    }

    #[test]
    fn test_silent_mode_installs_nothing() {
        assert!(init_logging(LoggingMode::Silent).is_ok());
    }
}
