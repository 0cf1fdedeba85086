//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ServerConfig.tls
//!     → tls.rs (PEM certificate + key → rustls config)
//!     → http::server (TLS listener)
//! ```
//!
//! # Design Decisions
//! - TLS is optional and handled transparently
//! - Missing files are reported before rustls parses anything

pub mod tls;
