//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, TLS, lifecycle component)
//!     → correlation.rs (correlation id from header or UUID, echoed on response)
//!     → wide_event.rs (EventContext + one wide event per request)
//!     → application routes
//!     → wide event committed with the response status
//! ```

pub mod correlation;
pub mod error;
pub mod server;
pub mod wide_event;

pub use correlation::{CorrelationHeader, CorrelationId, X_CORRELATION_ID};
pub use error::HttpError;
pub use server::{http_component, HttpServer, LocalAddr};
pub use wide_event::{wide_event_middleware, WideEventState};
