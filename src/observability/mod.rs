//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request / job
//!     → context.rs (EventContext: current wide event, logger fields, correlation id)
//!     → wide_event.rs (fields accumulate from any task)
//!     → commit → sink.rs (exactly one EventRecord)
//!              → metrics.rs (counters, duration histogram)
//!
//! Process start:
//!     → logging.rs (tracing subscriber, level threshold)
//! ```
//!
//! # Design Decisions
//! - One canonical record per operation instead of scattered log lines
//! - Sinks are injected through the context, never global
//! - Telemetry failures are swallowed, never surfaced to business logic

pub mod context;
pub mod logging;
pub mod metrics;
pub mod sink;
pub mod value;
pub mod wide_event;

pub use context::EventContext;
pub use logging::{init_logging, parse_level, LogConfig};
pub use sink::{EventRecord, EventSink, JsonSink, MemorySink, TracingSink};
pub use value::{Attr, Value};
pub use wide_event::WideEvent;
