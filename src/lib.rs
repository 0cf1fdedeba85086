//! Service runtime library.
//!
//! Two facilities for backend services:
//! - [`lifecycle`]: ordered setup → start → LIFO stop of a fixed set of components
//! - [`observability`]: wide events, one canonical record per logical operation,
//!   propagated through an [`EventContext`]
//!
//! plus the HTTP and configuration plumbing that wires them into a server.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::{Runtime, Setup, Starter, Stopper};
pub use observability::{Attr, EventContext, WideEvent};
