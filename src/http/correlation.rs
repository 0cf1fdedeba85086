//! Correlation id propagation.
//!
//! # Responsibilities
//! - Take the correlation id from the configured request header, or generate a UUID
//! - Expose it to later layers and handlers as a request extension
//! - Echo it on the response under the same header

use std::fmt;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Default header carrying the correlation id.
pub const X_CORRELATION_ID: &str = "x-correlation-id";

/// Token grouping log records that belong to one external interaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Fresh UUID v4 token.
    pub fn generate() -> Self {
        Self(Arc::from(uuid::Uuid::new_v4().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationId {
    fn from(value: &str) -> Self {
        Self(Arc::from(value))
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Header name the correlation middleware reads and writes.
#[derive(Debug, Clone)]
pub struct CorrelationHeader(pub HeaderName);

impl Default for CorrelationHeader {
    fn default() -> Self {
        Self(HeaderName::from_static(X_CORRELATION_ID))
    }
}

/// Attach a [`CorrelationId`] to the request and echo it on the response.
pub async fn correlation_middleware(
    State(header): State<CorrelationHeader>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let id = request
        .headers()
        .get(&header.0)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(CorrelationId::from)
        .unwrap_or_else(CorrelationId::generate);

    request.extensions_mut().insert(id.clone());
    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(id.as_str()) {
        response.headers_mut().insert(header.0, value);
    }
    response
}
