//! Shared utilities for integration tests.

use std::sync::{Arc, Mutex};

use service_runtime::lifecycle::{BoxError, Setup, Starter, Stopper};

/// Ordered record of lifecycle calls.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Entries with the given prefix, prefix stripped.
    pub fn phase(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_owned))
            .collect()
    }
}

/// A component that records setup, start and stop.
pub fn recorded(name: &'static str, journal: &Journal) -> Setup {
    let journal = journal.clone();
    Setup::new(name, move || {
        journal.push(format!("setup:{name}"));
        Ok(Some(Starter::new(move || async move {
            journal.push(format!("start:{name}"));
            Ok::<_, BoxError>(Some(Stopper::new(move || async move {
                journal.push(format!("stop:{name}"));
            })))
        })))
    })
}

/// A component whose starter fails.
#[allow(dead_code)]
pub fn failing_start(name: &'static str, journal: &Journal) -> Setup {
    let journal = journal.clone();
    Setup::new(name, move || {
        journal.push(format!("setup:{name}"));
        Ok(Some(Starter::new(move || async move {
            journal.push(format!("start:{name}"));
            Err::<Option<Stopper>, BoxError>(format!("{name} refused to start").into())
        })))
    })
}
