//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → env.rs (HTTP_SERVER_ADDRESS, ENABLE_TLS, LOG_LEVEL, … override)
//!     → validation.rs (semantic checks)
//!     → ServiceConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, parse_config, ConfigError};
pub use schema::{MetricsConfig, ServerConfig, ServiceConfig, TlsConfig};
pub use validation::{validate_config, ValidationError};
