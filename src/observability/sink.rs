//! Structured record sinks.
//!
//! A sink receives fully assembled records. A wide event commit produces
//! exactly one `emit` call; the sink decides transport and encoding.

use std::fmt;
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

use serde::{Serialize, Serializer};
use tracing::Level;

use crate::observability::value::{Attr, AttrMap, Value};

/// One structured log record.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub level: Level,
    pub message: String,
    pub attrs: Vec<Attr>,
}

impl EventRecord {
    /// First value recorded under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.iter().find(|a| a.key == key).map(|a| &a.value)
    }

    /// Every value recorded under `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.attrs
            .iter()
            .filter(move |a| a.key == key)
            .map(|a| &a.value)
    }

    /// Attributes as a single JSON object.
    pub fn attrs_json(&self) -> String {
        serde_json::to_string(&AttrMap(&self.attrs)).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Serialize for EventRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.attrs.len() + 2))?;
        map.serialize_entry("level", self.level.as_str())?;
        map.serialize_entry("msg", &self.message)?;
        for attr in &self.attrs {
            map.serialize_entry(attr.key.as_ref(), &attr.value)?;
        }
        map.end()
    }
}

/// Destination for structured records.
pub trait EventSink: Send + Sync {
    fn emit(&self, record: EventRecord);
}

/// Forwards records to the `tracing` subscriber.
///
/// Attribute names are dynamic, so they travel as one `fields` string on an
/// event with target `wide_event`. Suited to human-readable output; use
/// [`JsonSink`] when each attribute must be a queryable top-level field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, record: EventRecord) {
        let fields = record.attrs_json();
        let message = record.message.as_str();

        match record.level {
            Level::ERROR => tracing::error!(target: "wide_event", fields = %fields, "{message}"),
            Level::WARN => tracing::warn!(target: "wide_event", fields = %fields, "{message}"),
            Level::INFO => tracing::info!(target: "wide_event", fields = %fields, "{message}"),
            Level::DEBUG => tracing::debug!(target: "wide_event", fields = %fields, "{message}"),
            _ => tracing::trace!(target: "wide_event", fields = %fields, "{message}"),
        }
    }
}

/// Writes each record as one JSON line: `level`, `msg`, then every attribute
/// at the top level in insertion order.
///
/// A line is serialized before the writer lock is taken and written with a
/// single `write_all`, so concurrent commits never interleave.
pub struct JsonSink<W = io::Stdout> {
    writer: Mutex<W>,
}

impl JsonSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W> fmt::Debug for JsonSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonSink").finish_non_exhaustive()
    }
}

impl<W: Write + Send> EventSink for JsonSink<W> {
    fn emit(&self, record: EventRecord) {
        let mut line = match serde_json::to_vec(&record) {
            Ok(line) => line,
            Err(_) => return,
        };
        line.push(b'\n');

        let mut writer = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let _ = writer.write_all(&line).and_then(|()| writer.flush());
    }
}

/// Keeps records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<EventRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn records(&self) -> Vec<EventRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for MemorySink {
    fn emit(&self, record: EventRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }
}
