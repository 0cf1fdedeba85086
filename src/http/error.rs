//! HTTP server errors.

use std::io;
use std::net::AddrParseError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid server address {address:?}: {source}")]
    InvalidAddress {
        address: String,
        #[source]
        source: AddrParseError,
    },

    #[error("invalid correlation header name {0:?}")]
    InvalidHeader(String),

    #[error("TLS is disabled for a TLS-only server")]
    TlsDisabled,

    #[error("failed to load TLS configuration: {0}")]
    Tls(#[source] io::Error),

    #[error("failed to bind: {0}")]
    Bind(#[source] io::Error),
}
