//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Build (runtime.rs):
//!     Setup₁ → Setup₂ → … → Setupₙ          (fail-fast, process exits on error)
//!
//! Run (runtime.rs):
//!     Starter₁ → Starter₂ → … → Starterₙ    (fail-fast, stoppers recorded as we go)
//!
//! Stop (runtime.rs, shutdown.rs):
//!     Stopperₙ → … → Stopper₁               (LIFO, best effort)
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → resolve the shutdown future
//! ```
//!
//! # Design Decisions
//! - Setups only construct; starters own real resources
//! - The caller drives unwind after a failed start
//! - Long-running tasks listen on a `Shutdown` broadcast

pub mod error;
pub mod runtime;
pub mod shutdown;
pub mod signals;

pub use error::{BoxError, LifecycleError};
pub use runtime::{Runtime, RuntimeState, Setup, Starter, Stopper};
pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
