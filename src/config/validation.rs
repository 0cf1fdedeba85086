//! Configuration validation.
//!
//! Semantic checks only; serde handles syntax. Every problem is reported,
//! not just the first.

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("server.correlation_header: invalid header name {0:?}")]
    InvalidHeaderName(String),

    #[error("server.wide_event_name must not be empty")]
    EmptyEventName,

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("{field} must be set when TLS is enabled")]
    MissingTlsFile { field: &'static str },
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let server = &config.server;

    if server.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.address",
            value: server.address.clone(),
        });
    }

    if HeaderName::from_bytes(server.correlation_header.as_bytes()).is_err() {
        errors.push(ValidationError::InvalidHeaderName(
            server.correlation_header.clone(),
        ));
    }

    if server.wide_event_name.is_empty() {
        errors.push(ValidationError::EmptyEventName);
    }

    if server.request_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout);
    }

    if server.tls.enabled {
        if server.tls.cert_file.is_empty() {
            errors.push(ValidationError::MissingTlsFile {
                field: "server.tls.cert_file",
            });
        }
        if server.tls.key_file.is_empty() {
            errors.push(ValidationError::MissingTlsFile {
                field: "server.tls.key_file",
            });
        }
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "metrics.address",
            value: config.metrics.address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
