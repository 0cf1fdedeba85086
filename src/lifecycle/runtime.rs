//! Ordered component lifecycle.
//!
//! # State Machine
//! ```text
//! Runtime::new      Runtime::start        Runtime::stop
//!     ──▶ Built ──────────▶ Running ──────────▶ Stopped
//!                  └──(starter fails)──▶ Failed ──┘
//! ```
//!
//! # Design Decisions
//! - Setups run at build time, strictly in order, fail-fast
//! - Starters run in setup order; a stopper is recorded before the next starter runs
//! - A failed start does not unwind on its own; the caller decides when to `stop`
//! - Stoppers run last-started-first-stopped and are drained, so `stop` runs each once

use std::borrow::Cow;
use std::fmt;
use std::future::Future;

use futures_util::future::{self, BoxFuture, FutureExt};

use crate::lifecycle::error::{BoxError, LifecycleError};

type StartFuture = BoxFuture<'static, Result<Option<Stopper>, BoxError>>;

/// Teardown action for a started component.
pub struct Stopper(Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>);

impl Stopper {
    /// Create a stopper from an async closure.
    pub fn new<F, Fut>(stop: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self(Box::new(move || stop().boxed()))
    }

    /// Create a stopper from a synchronous closure.
    pub fn from_fn<F>(stop: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self(Box::new(move || {
            stop();
            future::ready(()).boxed()
        }))
    }

    async fn stop(self) {
        (self.0)().await
    }
}

impl fmt::Debug for Stopper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Stopper")
    }
}

/// Run-phase action for a component. Yields a [`Stopper`] when there is
/// something to tear down.
pub struct Starter(Box<dyn FnOnce() -> StartFuture + Send>);

impl Starter {
    /// Create a starter from an async closure.
    pub fn new<F, Fut>(start: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<Option<Stopper>, BoxError>> + Send + 'static,
    {
        Self(Box::new(move || start().boxed()))
    }

    async fn start(self) -> Result<Option<Stopper>, BoxError> {
        (self.0)().await
    }
}

impl fmt::Debug for Starter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Starter")
    }
}

/// Build-phase factory for a component.
///
/// Setups are expected to be side-effect light: anything holding a real
/// resource (sockets, tasks) belongs in the [`Starter`] they return.
pub struct Setup {
    name: Cow<'static, str>,
    build: Box<dyn FnOnce() -> Result<Option<Starter>, BoxError> + Send>,
}

impl Setup {
    /// Create a named setup.
    pub fn new<N, F>(name: N, build: F) -> Self
    where
        N: Into<Cow<'static, str>>,
        F: FnOnce() -> Result<Option<Starter>, BoxError> + Send + 'static,
    {
        Self {
            name: name.into(),
            build: Box::new(build),
        }
    }

    /// Component name used in logs and errors.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Setup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setup").field("name", &self.name).finish()
    }
}

/// Where a [`Runtime`] is in its single-use lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// All setups succeeded; nothing started yet.
    Built,
    /// Every starter succeeded.
    Running,
    /// A starter failed; components started before it are still running.
    Failed,
    /// Stoppers have been run.
    Stopped,
}

/// Orchestrates a fixed, ordered set of components.
pub struct Runtime {
    names: Vec<Cow<'static, str>>,
    starters: Vec<(Cow<'static, str>, Starter)>,
    stoppers: Vec<(Cow<'static, str>, Stopper)>,
    state: RuntimeState,
}

impl Runtime {
    /// Run every setup in order and collect their starters.
    ///
    /// Stops at the first failing setup; later setups are never invoked.
    pub fn new<I>(setups: I) -> Result<Self, LifecycleError>
    where
        I: IntoIterator<Item = Setup>,
    {
        let mut names = Vec::new();
        let mut starters = Vec::new();

        for Setup { name, build } in setups {
            match build() {
                Ok(Some(starter)) => {
                    tracing::debug!(component = %name, "Component set up");
                    names.push(name.clone());
                    starters.push((name, starter));
                }
                Ok(None) => {
                    tracing::debug!(component = %name, "Component set up without run phase");
                }
                Err(source) => {
                    return Err(LifecycleError::Setup {
                        component: name.into_owned(),
                        source,
                    });
                }
            }
        }

        Ok(Self {
            names,
            starters,
            stoppers: Vec::new(),
            state: RuntimeState::Built,
        })
    }

    /// Build the runtime, terminating the process if any setup fails.
    ///
    /// No cleanup of earlier setups is attempted.
    pub fn build_or_exit<I>(setups: I) -> Self
    where
        I: IntoIterator<Item = Setup>,
    {
        match Self::new(setups) {
            Ok(runtime) => runtime,
            Err(err) => {
                tracing::error!(
                    component = err.component().unwrap_or("unknown"),
                    error = %err,
                    "failed to set up component"
                );
                std::process::exit(1);
            }
        }
    }

    /// Run every starter in order.
    ///
    /// On the first failure the starter's error is returned and no further
    /// starters run. Components that already started stay up until
    /// [`Runtime::stop`] is called.
    pub async fn start(&mut self) -> Result<(), LifecycleError> {
        if self.state != RuntimeState::Built {
            return Err(LifecycleError::AlreadyStarted);
        }
        self.state = RuntimeState::Running;

        for (name, starter) in std::mem::take(&mut self.starters) {
            tracing::debug!(component = %name, "Starting component");

            match starter.start().await {
                Ok(stopper) => {
                    tracing::info!(component = %name, "Component started");
                    if let Some(stopper) = stopper {
                        self.stoppers.push((name, stopper));
                    }
                }
                Err(source) => {
                    self.state = RuntimeState::Failed;
                    return Err(LifecycleError::Start {
                        component: name.into_owned(),
                        source,
                    });
                }
            }
        }

        Ok(())
    }

    /// Tear down started components, last started first.
    ///
    /// Each stopper runs at most once over the life of the runtime.
    pub async fn stop(&mut self) {
        self.starters.clear();

        while let Some((name, stopper)) = self.stoppers.pop() {
            tracing::debug!(component = %name, "Stopping component");
            stopper.stop().await;
            tracing::info!(component = %name, "Component stopped");
        }

        self.state = RuntimeState::Stopped;
    }

    /// Start, wait for `shutdown`, then stop.
    ///
    /// `stop` runs whether or not `start` succeeded; the start error is
    /// returned after the unwind.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = ()>,
    {
        let result = self.start().await;
        match &result {
            Ok(()) => shutdown.await,
            Err(err) => tracing::error!(error = %err, "Runtime failed to start, unwinding"),
        }
        self.stop().await;
        result
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RuntimeState {
        self.state
    }

    /// Names of components with a run phase, in start order.
    pub fn component_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|name| name.as_ref())
    }

    /// Number of recorded stoppers not yet run.
    pub fn stopper_count(&self) -> usize {
        self.stoppers.len()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("components", &self.names)
            .field("stoppers", &self.stoppers.len())
            .field("state", &self.state)
            .finish()
    }
}
