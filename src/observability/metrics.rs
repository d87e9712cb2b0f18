//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pulsewatch_probes_total` (counter): attempts by url, status
//! - `pulsewatch_probe_latency_seconds` (histogram): attempt latency by url
//! - `pulsewatch_target_health` (gauge): 0=INIT, 1=OK, 2=PENDING, 3=ERROR
//! - `pulsewatch_notifications_total` (counter): by notifier, outcome
//! - `pulsewatch_sink_writes_total` (counter): by sink, outcome
//! - `pulsewatch_loop_restarts_total` (counter): probe loop panics by url
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Duration;

use ::metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::health::result::ProbeStatus;
use crate::health::state::HealthState;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_probe(url: &str, status: ProbeStatus, latency: Duration) {
    counter!(
        "pulsewatch_probes_total",
        "url" => url.to_string(),
        "status" => status.as_str()
    )
    .increment(1);
    histogram!("pulsewatch_probe_latency_seconds", "url" => url.to_string())
        .record(latency.as_secs_f64());
}

pub fn record_target_health(url: &str, state: HealthState) {
    gauge!("pulsewatch_target_health", "url" => url.to_string()).set(state.gauge_value());
}

pub fn record_notification(notifier: &str, ok: bool) {
    counter!(
        "pulsewatch_notifications_total",
        "notifier" => notifier.to_string(),
        "outcome" => outcome(ok)
    )
    .increment(1);
}

pub fn record_sink_write(sink: &str, ok: bool) {
    counter!(
        "pulsewatch_sink_writes_total",
        "sink" => sink.to_string(),
        "outcome" => outcome(ok)
    )
    .increment(1);
}

pub fn record_loop_restart(url: &str) {
    counter!("pulsewatch_loop_restarts_total", "url" => url.to_string()).increment(1);
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "success"
    } else {
        "failure"
    }
}
