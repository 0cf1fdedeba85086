//! One wide event per HTTP request.
//!
//! # Responsibilities
//! - Derive the request's `EventContext` (correlation id, method, path)
//! - Ensure a wide event is bound, reusing one an outer layer already opened
//! - Record the response status and commit after the handler returns
//!
//! Handlers reach the context with the [`EventContext`] extractor.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{request::Parts, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::Level;

use crate::http::correlation::CorrelationId;
use crate::observability::{Attr, EventContext};

/// Middleware state: event name and the root context new requests derive from.
#[derive(Debug, Clone)]
pub struct WideEventState {
    name: Arc<str>,
    root: EventContext,
}

impl WideEventState {
    pub fn new(name: impl Into<Arc<str>>, root: EventContext) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }
}

/// Open (or reuse) the request's wide event and commit it once the response is ready.
pub async fn wide_event_middleware(
    State(state): State<WideEventState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let correlation_id = request
        .extensions()
        .get::<CorrelationId>()
        .map(|id| id.as_str().to_owned())
        .unwrap_or_else(|| "unknown".to_owned());

    let ctx = request
        .extensions()
        .get::<EventContext>()
        .cloned()
        .unwrap_or_else(|| state.root.clone())
        .with_correlation_id(correlation_id.as_str())
        .with_fields([
            Attr::new("correlation_id", correlation_id),
            Attr::new("method", request.method().as_str().to_owned()),
            Attr::new("path", request.uri().path().to_owned()),
        ]);

    let (ctx, event) = ctx.ensure_wide_event(&state.name, []);
    request.extensions_mut().insert(ctx);

    let response = next.run(request).await;

    let status = response.status();
    event.add([Attr::new("status", status.as_u16())]);
    if status.is_server_error() {
        event.set_level(Level::ERROR);
    }
    event.commit([]);

    response
}

/// Extracts the context [`wide_event_middleware`] bound to the request.
///
/// Routes not wrapped by the middleware are rejected with 500 rather than
/// handed a fresh root, which would bypass the configured sink.
impl<S> FromRequestParts<S> for EventContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<EventContext>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "request context missing: route is not wrapped by the wide event middleware",
        ))
    }
}
