//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PulsewatchConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// Endpoints to probe.
    pub monitors: Vec<MonitorConfig>,

    /// Alert destinations. Empty means log-only alerts.
    pub notifiers: Vec<NotifierConfig>,

    /// Result destinations. Empty means console output.
    pub sinks: Vec<SinkConfig>,
}

/// One monitored endpoint.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct MonitorConfig {
    /// URL to GET.
    pub url: String,

    /// Consecutive failures tolerated before an outage is confirmed.
    #[serde(default = "default_retry")]
    pub retry: u32,

    /// Seconds between the starts of two attempts.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_retry() -> u32 {
    2
}

fn default_interval_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    5
}

/// Alert destination.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotifierConfig {
    /// Structured log line at warn level.
    Log,

    /// Discord webhook.
    Discord { webhook: String },

    /// Telegram Bot API.
    Telegram { token: String, chat_id: String },
}

/// Result destination.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    /// JSON line per result on stdout.
    Console,

    /// JSON line per result appended to a file.
    JsonLines { path: String },

    /// Row per result in a SQLite database.
    Sqlite {
        #[serde(default = "default_sqlite_path")]
        path: String,
    },
}

fn default_sqlite_path() -> String {
    "./monitors.db".to_string()
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log filter directive (e.g. "info" or "pulsewatch=debug").
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
