//! Per-operation context: the current wide event, the current logger and the
//! correlation id.
//!
//! # Design Decisions
//! - Contexts are immutable; every `with_*` call derives a new one
//! - At most one wide event is bound; binding another shadows it
//! - The sink is injected, not looked up from process-wide state

use std::fmt;
use std::sync::Arc;

use tracing::Level;

use crate::observability::sink::{EventRecord, EventSink, TracingSink};
use crate::observability::value::Attr;
use crate::observability::wide_event::WideEvent;

/// Values that travel with one logical operation.
///
/// Cheap to clone: everything inside is reference counted.
#[derive(Clone)]
pub struct EventContext {
    sink: Arc<dyn EventSink>,
    fields: Arc<[Attr]>,
    wide_event: Option<Arc<WideEvent>>,
    correlation_id: Option<Arc<str>>,
}

impl EventContext {
    /// Root context writing to `sink`.
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            fields: Arc::from(Vec::new()),
            wide_event: None,
            correlation_id: None,
        }
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    /// Derive a context with `event` as the current wide event.
    pub fn with_wide_event(&self, event: Arc<WideEvent>) -> Self {
        Self {
            wide_event: Some(event),
            ..self.clone()
        }
    }

    /// The current wide event, if one was bound on this context chain.
    pub fn wide_event(&self) -> Option<&Arc<WideEvent>> {
        self.wide_event.as_ref()
    }

    /// Return the current wide event, or create one named `name` and bind it.
    ///
    /// A new event is seeded with this context's logger fields, then `initial`.
    /// When an event is already bound, `initial` is ignored and the context is
    /// returned as is.
    pub fn ensure_wide_event<I>(&self, name: &str, initial: I) -> (Self, Arc<WideEvent>)
    where
        I: IntoIterator<Item = Attr>,
    {
        if let Some(event) = &self.wide_event {
            return (self.clone(), Arc::clone(event));
        }

        let seed = self.fields.iter().cloned().chain(initial);
        let event = Arc::new(WideEvent::new(name, Arc::clone(&self.sink), seed));
        (self.with_wide_event(Arc::clone(&event)), event)
    }

    /// Derive a logger context with extra fields appended.
    pub fn with_fields<I>(&self, attrs: I) -> Self
    where
        I: IntoIterator<Item = Attr>,
    {
        let fields: Vec<Attr> = self.fields.iter().cloned().chain(attrs).collect();
        Self {
            fields: Arc::from(fields),
            ..self.clone()
        }
    }

    pub fn fields(&self) -> &[Attr] {
        &self.fields
    }

    /// Emit an ordinary record: context fields first, then `attrs`.
    pub fn log<I>(&self, level: Level, message: impl Into<String>, attrs: I)
    where
        I: IntoIterator<Item = Attr>,
    {
        self.sink.emit(EventRecord {
            level,
            message: message.into(),
            attrs: self.fields.iter().cloned().chain(attrs).collect(),
        });
    }

    pub fn with_correlation_id(&self, id: impl Into<Arc<str>>) -> Self {
        Self {
            correlation_id: Some(id.into()),
            ..self.clone()
        }
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

impl Default for EventContext {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}

impl fmt::Debug for EventContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("fields", &self.fields)
            .field("wide_event", &self.wide_event)
            .field("correlation_id", &self.correlation_id)
            .finish()
    }
}
