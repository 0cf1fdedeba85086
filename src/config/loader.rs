//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use envconfig::Envconfig;
use thiserror::Error;

use crate::config::env::EnvOverrides;
use crate::config::schema::ServiceConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment error: {0}")]
    Env(#[from] envconfig::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate a TOML document, without the environment overlay.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load a TOML file, apply environment overrides, then validate.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ServiceConfig = toml::from_str(&content)?;
    finish(config)
}

/// Defaults plus environment overrides.
pub fn load_from_env() -> Result<ServiceConfig, ConfigError> {
    finish(ServiceConfig::default())
}

fn finish(mut config: ServiceConfig) -> Result<ServiceConfig, ConfigError> {
    EnvOverrides::init_from_env()?.apply(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.address, "0.0.0.0:9440");
        assert_eq!(config.server.wide_event_name, "http.request");
        assert!(!config.server.tls.enabled);
    }

    #[test]
    fn partial_document_keeps_other_defaults() {
        let config = parse_config(
            r#"
            [server]
            address = "127.0.0.1:7000"
            request_timeout_secs = 15

            [logging]
            level = "info"
            json = false
            "#,
        )
        .unwrap();

        assert_eq!(config.server.address, "127.0.0.1:7000");
        assert_eq!(config.server.request_timeout_secs, Some(15));
        assert_eq!(config.server.correlation_header, "x-correlation-id");
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = parse_config("[server]\naddress = \"nowhere\"").unwrap_err();
        assert!(matches!(err, ConfigError::Validation(ref errors) if errors.len() == 1));
        assert!(err.to_string().contains("server.address"));
    }

    #[test]
    fn syntax_errors_are_parse_errors() {
        assert!(matches!(
            parse_config("[server"),
            Err(ConfigError::Parse(_))
        ));
    }
}
