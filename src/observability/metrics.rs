//! Metrics collection and exposition.
//!
//! # Metrics
//! - `wide_events_committed_total` (counter): committed wide events by level
//! - `wide_event_duration_seconds` (histogram): time from creation to commit
//!
//! The Prometheus exporter is optional; without it the `metrics` macros are no-ops.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use tracing::Level;

const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
];

/// Install the Prometheus recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .set_buckets(DURATION_BUCKETS)?
        .install()?;

    tracing::info!(address = %addr, "Metrics endpoint started");
    Ok(())
}

/// Record one committed wide event.
pub fn record_wide_event(level: Level, duration: Duration) {
    ::metrics::counter!("wide_events_committed_total", "level" => level.as_str()).increment(1);
    ::metrics::histogram!("wide_event_duration_seconds").record(duration.as_secs_f64());
}
