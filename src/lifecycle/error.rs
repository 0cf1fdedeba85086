//! Lifecycle error types.

use thiserror::Error;

/// Error type returned by component setups and starters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error type for runtime build and start.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A setup failed while the runtime was being built.
    #[error("failed to set up component {component}: {source}")]
    Setup {
        component: String,
        #[source]
        source: BoxError,
    },

    /// A starter failed during `Runtime::start`.
    #[error("failed to start component {component}: {source}")]
    Start {
        component: String,
        #[source]
        source: BoxError,
    },

    /// `Runtime::start` was called on a runtime that already ran its starters.
    #[error("runtime has already been started")]
    AlreadyStarted,
}

impl LifecycleError {
    /// Name of the component that failed, if any.
    pub fn component(&self) -> Option<&str> {
        match self {
            LifecycleError::Setup { component, .. } | LifecycleError::Start { component, .. } => {
                Some(component)
            }
            LifecycleError::AlreadyStarted => None,
        }
    }

    /// The component's own error, unchanged.
    pub fn into_source(self) -> Option<BoxError> {
        match self {
            LifecycleError::Setup { source, .. } | LifecycleError::Start { source, .. } => {
                Some(source)
            }
            LifecycleError::AlreadyStarted => None,
        }
    }
}
