//! Structured logging setup.
//!
//! # Design Decisions
//! - One severity threshold string, case-insensitive, DEBUG when unset or unknown
//! - `RUST_LOG`, when set, takes precedence over the configured level
//! - JSON output for production, pretty output for development

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;
use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// DEBUG, INFO, WARN or ERROR.
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "DEBUG".to_string(),
            json: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to install tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Parse a severity threshold. Unknown or empty input falls back to DEBUG.
pub fn parse_level(level: &str) -> Level {
    match level.trim().to_ascii_uppercase().as_str() {
        "TRACE" => Level::TRACE,
        "INFO" => Level::INFO,
        "WARN" | "WARNING" => Level::WARN,
        "ERROR" => Level::ERROR,
        _ => Level::DEBUG,
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &LogConfig) -> Result<Level, LoggingError> {
    let level = parse_level(&config.level);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    Ok(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_case_insensitive() {
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("Warn"), Level::WARN);
        assert_eq!(parse_level("ERROR"), Level::ERROR);
        assert_eq!(parse_level("debug"), Level::DEBUG);
    }

    #[test]
    fn unknown_levels_fall_back_to_debug() {
        assert_eq!(parse_level(""), Level::DEBUG);
        assert_eq!(parse_level("verbose"), Level::DEBUG);
    }

    #[test]
    fn default_config_is_most_verbose() {
        assert_eq!(parse_level(&LogConfig::default().level), Level::DEBUG);
    }
}
