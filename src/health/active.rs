//! Per-target probe loop.
//!
//! # Responsibilities
//! - Probe one target, classify the outcome, advance its state machine
//! - Notify on confirmed edges, record every attempt
//! - Pace attempts one interval apart, start to start
//!
//! # Pacing
//! ```text
//! t0 ─ probe ─ dispatch ─ wait ──────────▶ t0+interval ─ probe ─ ...
//! ```
//! There is no pre-probe delay: a fresh failure is evaluated as soon as it
//! happens, and every later attempt on an unresolved problem is throttled
//! by the full interval. Shutdown is checked before every attempt and
//! interrupts the wait; an attempt already in flight is allowed to finish
//! (bounded by the request timeout) and is dispatched before exit.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use reqwest::StatusCode;
use tokio::time::{self, Instant};

use crate::dispatch::Dispatcher;
use crate::health::probe::Prober;
use crate::health::result::{ProbeResult, ProbeStatus};
use crate::health::state::{HealthState, Outcome, Transition};
use crate::health::target::{Target, TargetSpec};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;

/// Deadline used when `interval` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

pub struct ProbeLoop {
    target: Target,
    prober: Arc<dyn Prober>,
    dispatcher: Arc<Dispatcher>,
    shutdown: ShutdownSignal,
}

impl ProbeLoop {
    pub fn new(
        spec: Arc<TargetSpec>,
        prober: Arc<dyn Prober>,
        dispatcher: Arc<Dispatcher>,
        shutdown: ShutdownSignal,
    ) -> Self {
        Self {
            target: Target::new(spec),
            prober,
            dispatcher,
            shutdown,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Run until shutdown is signalled.
    pub async fn run(mut self) {
        let interval = self.target.spec().interval;

        tracing::info!(
            url = %self.target.url(),
            interval = ?interval,
            retry_budget = self.target.spec().retry_budget,
            "Probe loop starting"
        );
        metrics::record_target_health(self.target.url(), HealthState::Init);

        loop {
            if self.shutdown.is_triggered() {
                break;
            }

            let next_attempt = deadline_after(Instant::now(), interval);
            self.tick().await;

            tokio::select! {
                _ = time::sleep_until(next_attempt) => {}
                _ = self.shutdown.recv() => break,
            }
        }

        tracing::info!(
            url = %self.target.url(),
            state = %self.target.state(),
            "Probe loop stopped"
        );
    }

    /// Perform one attempt: probe, classify, advance, dispatch.
    pub async fn tick(&mut self) -> Transition {
        let spec = self.target.spec().clone();
        let started_at = Utc::now();
        let started = Instant::now();

        let reply = self.prober.probe(&spec).await;
        let latency = started.elapsed();

        let (outcome, status, message) = match reply {
            Ok(code) if code == StatusCode::OK => {
                (Outcome::Success, ProbeStatus::Ok, status_message(code))
            }
            Ok(code) => (Outcome::Failure, ProbeStatus::Error, status_message(code)),
            Err(e) => (Outcome::Failure, ProbeStatus::Error, e.to_string()),
        };

        let transition = self.target.observe(outcome);
        let result = ProbeResult::new(started_at, status, latency, spec.url.as_str(), message);

        metrics::record_probe(&spec.url, status, latency);
        if transition.is_change() {
            metrics::record_target_health(&spec.url, transition.to);
        }

        if transition.notify {
            tracing::info!(
                url = %spec.url,
                from = %transition.from,
                to = %transition.to,
                message = %result.message,
                "Confirmed health change"
            );
            self.dispatcher.notify(&result).await;
        } else if transition.is_change() {
            tracing::debug!(
                url = %spec.url,
                from = %transition.from,
                to = %transition.to,
                failures = transition.failures,
                "Health state changed"
            );
        }

        self.dispatcher.record(&result).await;
        transition
    }
}

fn deadline_after(start: Instant, interval: Duration) -> Instant {
    start
        .checked_add(interval)
        .unwrap_or_else(|| start + FAR_FUTURE)
}

/// `"<code> <reason>"`, or just the code when it has no registered reason.
fn status_message(code: StatusCode) -> String {
    match code.canonical_reason() {
        Some(reason) => format!("{} {}", code.as_u16(), reason),
        None => code.as_u16().to_string(),
    }
}
