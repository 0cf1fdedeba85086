//! Wide events: one canonical record per logical operation.
//!
//! # Data Flow
//! ```text
//! WideEvent::new  ──▶ add / add_kvs / set_level / set_message (any task, any order)
//!                 ──▶ commit (first caller wins) ──▶ EventSink::emit (exactly once)
//! ```
//!
//! # Design Decisions
//! - One mutex guards attributes, level, message and the committed flag
//! - Mutation after commit is dropped silently; telemetry never fails the caller
//! - The sink is called outside the lock

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::Level;

use crate::observability::metrics;
use crate::observability::sink::{EventRecord, EventSink};
use crate::observability::value::{Attr, Value};

struct State {
    attrs: Vec<Attr>,
    level: Level,
    message: String,
    committed: bool,
}

/// Accumulates fields for one logical operation and emits them as a single
/// record on [`WideEvent::commit`].
///
/// Share it through an `Arc`; every method takes `&self`.
pub struct WideEvent {
    name: String,
    event_id: String,
    started_at: DateTime<Utc>,
    started: Instant,
    sink: Arc<dyn EventSink>,
    state: Mutex<State>,
}

impl WideEvent {
    /// Create an event stamped with `event`, `event_id` and `event_start`,
    /// followed by `initial`.
    pub fn new<I>(name: impl Into<String>, sink: Arc<dyn EventSink>, initial: I) -> Self
    where
        I: IntoIterator<Item = Attr>,
    {
        let name = name.into();
        let event_id = new_event_id();
        let started_at = Utc::now();

        let mut attrs = vec![
            Attr::new("event", name.clone()),
            Attr::new("event_id", event_id.clone()),
            Attr::new("event_start", started_at),
        ];
        attrs.extend(initial);

        Self {
            state: Mutex::new(State {
                attrs,
                level: Level::INFO,
                message: name.clone(),
                committed: false,
            }),
            name,
            event_id,
            started_at,
            started: Instant::now(),
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// 32 lowercase hex characters.
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn is_committed(&self) -> bool {
        self.lock().committed
    }

    /// Append attributes.
    pub fn add<I>(&self, attrs: I)
    where
        I: IntoIterator<Item = Attr>,
    {
        let mut attrs = attrs.into_iter().peekable();
        if attrs.peek().is_none() {
            return;
        }

        let mut state = self.lock();
        if state.committed {
            return;
        }
        state.attrs.extend(attrs);
    }

    /// Append an interleaved `key, value, key, value, …` sequence.
    ///
    /// Pairs whose key is not a non-empty string are skipped, and a trailing
    /// unpaired value is ignored.
    pub fn add_kvs<I, V>(&self, kvs: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut kvs = kvs.into_iter().map(Into::into);
        let mut attrs = Vec::new();

        while let (Some(key), Some(value)) = (kvs.next(), kvs.next()) {
            match key {
                Value::Str(key) if !key.is_empty() => attrs.push(Attr::new(key, value)),
                _ => continue,
            }
        }

        self.add(attrs);
    }

    /// Level used on commit (default INFO).
    pub fn set_level(&self, level: Level) {
        let mut state = self.lock();
        if state.committed {
            return;
        }
        state.level = level;
    }

    /// Message used on commit (default: the event name). Empty messages are ignored.
    pub fn set_message(&self, message: impl Into<String>) {
        let message = message.into();
        if message.is_empty() {
            return;
        }

        let mut state = self.lock();
        if state.committed {
            return;
        }
        state.message = message;
    }

    /// Emit the event. Only the first call emits; the return value says
    /// whether this call was it.
    pub fn commit<I>(&self, extra: I) -> bool
    where
        I: IntoIterator<Item = Attr>,
    {
        let (mut attrs, level, message) = {
            let mut state = self.lock();
            if state.committed {
                return false;
            }
            state.committed = true;
            (
                std::mem::take(&mut state.attrs),
                state.level,
                std::mem::take(&mut state.message),
            )
        };

        let duration = self.started.elapsed();
        attrs.push(Attr::new("event_end", Utc::now()));
        attrs.push(Attr::new("event_duration", duration));
        attrs.extend(extra);

        metrics::record_wide_event(level, duration);
        self.sink.emit(EventRecord {
            level,
            message,
            attrs,
        });
        true
    }

    /// Mark the event as failed and commit at ERROR.
    pub fn commit_error<I>(&self, err: Option<&dyn fmt::Display>, extra: I) -> bool
    where
        I: IntoIterator<Item = Attr>,
    {
        match err {
            Some(err) => self.add([
                Attr::new("error", true),
                Attr::new("error_message", err.to_string()),
            ]),
            None => self.add([Attr::new("error", true)]),
        }
        self.set_level(Level::ERROR);
        self.commit(extra)
    }

    /// Mark the event as cancelled and commit at WARN.
    pub fn cancel<I>(&self, reason: &str, extra: I) -> bool
    where
        I: IntoIterator<Item = Attr>,
    {
        self.add([Attr::new("cancelled", true)]);
        if !reason.is_empty() {
            self.add([Attr::new("cancel_reason", reason)]);
        }
        self.set_level(Level::WARN);
        self.commit(extra)
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for WideEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WideEvent")
            .field("name", &self.name)
            .field("event_id", &self.event_id)
            .field("committed", &self.is_committed())
            .finish()
    }
}

/// 128 random bits as lowercase hex.
fn new_event_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::sink::MemorySink;
    use std::io;

    fn new_event(name: &str) -> (Arc<MemorySink>, WideEvent) {
        let sink = Arc::new(MemorySink::new());
        let event = WideEvent::new(name, sink.clone(), []);
        (sink, event)
    }

    fn keys(record: &EventRecord) -> Vec<&str> {
        record.attrs.iter().map(|a| a.key.as_ref()).collect()
    }

    #[test]
    fn canonical_fields_come_first() {
        let (sink, event) = new_event("checkout");
        event.add([Attr::new("user_id", 42)]);
        assert!(event.commit([Attr::new("status", 200)]));

        let record = &sink.records()[0];
        assert_eq!(
            keys(record),
            [
                "event",
                "event_id",
                "event_start",
                "user_id",
                "event_end",
                "event_duration",
                "status"
            ]
        );
        assert_eq!(record.level, Level::INFO);
        assert_eq!(record.message, "checkout");
        assert_eq!(record.get("event_id").and_then(Value::as_str), Some(event.event_id()));
    }

    #[test]
    fn event_id_is_32_hex_chars() {
        let (_, a) = new_event("a");
        let (_, b) = new_event("b");
        assert_eq!(a.event_id().len(), 32);
        assert!(a.event_id().chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_ne!(a.event_id(), b.event_id());
    }

    #[test]
    fn initial_attrs_follow_canonical_fields() {
        let sink = Arc::new(MemorySink::new());
        let event = WideEvent::new("job", sink.clone(), [Attr::new("queue", "emails")]);
        event.commit([]);
        assert_eq!(keys(&sink.records()[0])[..4], ["event", "event_id", "event_start", "queue"]);
    }

    #[test]
    fn commit_emits_once() {
        let (sink, event) = new_event("once");
        assert!(event.commit([]));
        assert!(!event.commit([]));
        assert!(!event.commit([Attr::new("late", true)]));
        assert_eq!(sink.len(), 1);
        assert!(event.is_committed());
    }

    #[test]
    fn mutation_after_commit_is_dropped() {
        let (sink, event) = new_event("frozen");
        event.commit([]);

        event.add([Attr::new("late", true)]);
        event.add_kvs(["also", "late"]);
        event.set_level(Level::ERROR);
        event.set_message("changed");
        event.commit([]);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("late"), None);
        assert_eq!(records[0].level, Level::INFO);
        assert_eq!(records[0].message, "frozen");
    }

    #[test]
    fn add_kvs_drops_trailing_value() {
        let (sink, event) = new_event("kv");
        event.add_kvs([Value::from("a"), Value::from(1), Value::from("b")]);
        event.commit([]);

        let record = &sink.records()[0];
        assert_eq!(record.get("a"), Some(&Value::I64(1)));
        assert_eq!(record.get("b"), None);
    }

    #[test]
    fn add_kvs_skips_invalid_keys() {
        let (sink, event) = new_event("kv");
        event.add_kvs([
            Value::from(7),
            Value::from("seven"),
            Value::from(""),
            Value::from("empty"),
            Value::from("ok"),
            Value::from(true),
        ]);
        event.commit([]);

        let record = &sink.records()[0];
        assert_eq!(keys(record)[3..], ["ok", "event_end", "event_duration"]);
    }

    #[test]
    fn empty_message_keeps_default() {
        let (sink, event) = new_event("default-message");
        event.set_message("");
        event.commit([]);
        assert_eq!(sink.records()[0].message, "default-message");

        let (sink, event) = new_event("custom");
        event.set_message("checkout finished");
        event.set_level(Level::DEBUG);
        event.commit([]);
        assert_eq!(sink.records()[0].message, "checkout finished");
        assert_eq!(sink.records()[0].level, Level::DEBUG);
    }

    #[test]
    fn commit_error_marks_event() {
        let (sink, event) = new_event("payment");
        let err = io::Error::new(io::ErrorKind::Other, "card declined");
        assert!(event.commit_error(Some(&err), []));

        let record = &sink.records()[0];
        assert_eq!(record.level, Level::ERROR);
        assert_eq!(record.get("error"), Some(&Value::Bool(true)));
        assert_eq!(
            record.get("error_message").and_then(Value::as_str),
            Some("card declined")
        );
    }

    #[test]
    fn commit_error_without_error_value() {
        let (sink, event) = new_event("payment");
        event.commit_error(None, []);

        let record = &sink.records()[0];
        assert_eq!(record.get("error"), Some(&Value::Bool(true)));
        assert_eq!(record.get("error_message"), None);
    }

    #[test]
    fn cancel_marks_event() {
        let (sink, event) = new_event("upload");
        assert!(event.cancel("client went away", [Attr::new("bytes", 512u64)]));

        let record = &sink.records()[0];
        assert_eq!(record.level, Level::WARN);
        assert_eq!(record.get("cancelled"), Some(&Value::Bool(true)));
        assert_eq!(
            record.get("cancel_reason").and_then(Value::as_str),
            Some("client went away")
        );
        assert_eq!(record.get("bytes"), Some(&Value::U64(512)));
    }

    #[test]
    fn cancel_after_commit_does_nothing() {
        let (sink, event) = new_event("upload");
        event.commit([]);
        assert!(!event.cancel("", []));
        assert_eq!(sink.records()[0].get("cancelled"), None);
        assert_eq!(sink.records()[0].get("cancel_reason"), None);
    }

    #[test]
    fn concurrent_contributors_all_land() {
        let (sink, event) = new_event("checkout");
        let event = Arc::new(event);

        std::thread::scope(|s| {
            for _ in 0..2 {
                let event = &event;
                s.spawn(move || event.add([Attr::new("user_id", 42)]));
            }
        });
        event.commit([]);

        let records = sink.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.get("event").and_then(Value::as_str), Some("checkout"));
        assert_eq!(record.get_all("user_id").count(), 2);
        assert!(record.get("event_duration").and_then(Value::as_duration).is_some());
    }

    #[test]
    fn concurrent_commits_emit_once_with_every_prior_add() {
        let (sink, event) = new_event("race");
        let event = Arc::new(event);
        let workers = 16;

        let barrier = std::sync::Barrier::new(workers);
        std::thread::scope(|s| {
            for i in 0..workers {
                let (event, barrier) = (&event, &barrier);
                s.spawn(move || {
                    barrier.wait();
                    event.add([Attr::new("worker", i as u64)]);
                });
            }
        });

        let barrier = std::sync::Barrier::new(workers);
        let winners = std::thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let (event, barrier) = (&event, &barrier);
                    s.spawn(move || {
                        barrier.wait();
                        event.commit([])
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|won| *won)
                .count()
        });

        assert_eq!(winners, 1);
        assert_eq!(sink.len(), 1);

        let record = &sink.records()[0];
        let mut seen: Vec<u64> = record
            .get_all("worker")
            .map(|v| match v {
                Value::U64(n) => *n,
                other => panic!("unexpected worker value {other:?}"),
            })
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..workers as u64).collect::<Vec<_>>());
    }
}
