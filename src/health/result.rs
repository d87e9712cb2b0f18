//! Probe result record.
//!
//! This is the record every sink and notifier receives. Field names are a
//! compatibility contract:
//!
//! ```text
//! { "@timestamp": "2024-05-01T12:00:00Z", "status": "OK" | "ERROR",
//!   "latency_ms": 42, "url": "...", "message": "200 OK" }
//! ```

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Classified status of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeStatus {
    Ok,
    Error,
}

impl ProbeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeStatus::Ok => "OK",
            ProbeStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of one probe attempt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    /// Attempt start, RFC3339 in UTC.
    #[serde(rename = "@timestamp")]
    pub timestamp: String,
    pub status: ProbeStatus,
    pub latency_ms: u64,
    pub url: String,
    /// HTTP status line or the transport error description.
    pub message: String,
}

impl ProbeResult {
    pub fn new(
        started_at: DateTime<Utc>,
        status: ProbeStatus,
        latency: Duration,
        url: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: started_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            status,
            latency_ms: u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// One-line alert text for chat notifiers.
    pub fn alert_text(&self) -> String {
        format!(
            "[{}] {} - {} ({} ms)",
            self.status, self.url, self.message, self.latency_ms
        )
    }
}
