//! Result dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Probe loop (one per target)
//!     → Dispatcher::notify  (confirmed edges only) → every Notifier
//!     → Dispatcher::record  (every attempt)        → every ResultSink
//! ```
//!
//! # Design Decisions
//! - Calls are awaited in order inside the loop iteration, never detached,
//!   so nothing is in flight once a loop has exited
//! - One failing collaborator is logged and skipped; the rest still run
//! - Collaborators are shared by all targets and must tolerate concurrent
//!   calls; sinks serialize their own writes

pub mod notifiers;
pub mod sinks;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::health::result::ProbeResult;
use crate::observability::metrics;

/// Errors from delivering an alert.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote end answered with a non-success status.
    #[error("notification rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from recording a result.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Delivers an alert for a confirmed state change.
///
/// Implementations must bound their own latency (e.g. an HTTP timeout).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short identifier used in logs and metrics.
    fn name(&self) -> &str;

    async fn notify(&self, result: &ProbeResult) -> Result<(), NotifyError>;
}

/// Records every probe result.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Short identifier used in logs and metrics.
    fn name(&self) -> &str;

    async fn write(&self, result: &ProbeResult) -> Result<(), SinkError>;

    /// Flush buffered output and release resources. Must be idempotent.
    async fn close(&self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Fans a result out to all configured collaborators.
#[derive(Clone, Default)]
pub struct Dispatcher {
    notifiers: Vec<Arc<dyn Notifier>>,
    sinks: Vec<Arc<dyn ResultSink>>,
}

impl Dispatcher {
    pub fn new(notifiers: Vec<Arc<dyn Notifier>>, sinks: Vec<Arc<dyn ResultSink>>) -> Self {
        Self { notifiers, sinks }
    }

    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Call every notifier in configuration order.
    pub async fn notify(&self, result: &ProbeResult) {
        for notifier in &self.notifiers {
            match notifier.notify(result).await {
                Ok(()) => {
                    metrics::record_notification(notifier.name(), true);
                }
                Err(e) => {
                    tracing::warn!(
                        notifier = notifier.name(),
                        url = %result.url,
                        error = %e,
                        "Notification failed"
                    );
                    metrics::record_notification(notifier.name(), false);
                }
            }
        }
    }

    /// Call every sink in configuration order.
    pub async fn record(&self, result: &ProbeResult) {
        for sink in &self.sinks {
            match sink.write(result).await {
                Ok(()) => metrics::record_sink_write(sink.name(), true),
                Err(e) => {
                    tracing::warn!(
                        sink = sink.name(),
                        url = %result.url,
                        error = %e,
                        "Result sink write failed"
                    );
                    metrics::record_sink_write(sink.name(), false);
                }
            }
        }
    }

    /// Close every sink. Safe to call more than once.
    pub async fn close(&self) {
        for sink in &self.sinks {
            if let Err(e) = sink.close().await {
                tracing::warn!(sink = sink.name(), error = %e, "Failed to close result sink");
            }
        }
    }
}
