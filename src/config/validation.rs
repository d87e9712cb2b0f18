//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate URLs, value ranges and required notifier/sink fields
//! - Reject duplicate monitor URLs (the URL is a target's identity)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PulsewatchConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::config::schema::{NotifierConfig, PulsewatchConfig, SinkConfig};

/// Longest accepted probe interval (one week).
pub const MAX_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Longest accepted request timeout (one hour).
pub const MAX_TIMEOUT_SECS: u64 = 60 * 60;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no monitors configured")]
    NoMonitors,

    #[error("monitor url '{url}' is invalid: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("monitor url '{url}' has unsupported scheme '{scheme}' (expected http or https)")]
    UnsupportedScheme { url: String, scheme: String },

    #[error("monitor url '{0}' is configured more than once")]
    DuplicateUrl(String),

    #[error("monitor '{0}': interval_secs must be greater than 0")]
    ZeroInterval(String),

    #[error("monitor '{0}': timeout_secs must be greater than 0")]
    ZeroTimeout(String),

    #[error("monitor '{url}': interval_secs must be at most {max}")]
    IntervalTooLong { url: String, max: u64 },

    #[error("monitor '{url}': timeout_secs must be at most {max}")]
    TimeoutTooLong { url: String, max: u64 },

    #[error("{section}: '{field}' must not be empty")]
    EmptyField {
        section: &'static str,
        field: &'static str,
    },

    #[error("invalid log_level '{0}'")]
    InvalidLogLevel(String),

    #[error("invalid metrics_address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &PulsewatchConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.monitors.is_empty() {
        errors.push(ValidationError::NoMonitors);
    }

    let mut seen = HashSet::new();
    for monitor in &config.monitors {
        match Url::parse(&monitor.url) {
            Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
            Ok(url) => errors.push(ValidationError::UnsupportedScheme {
                url: monitor.url.clone(),
                scheme: url.scheme().to_string(),
            }),
            Err(e) => errors.push(ValidationError::InvalidUrl {
                url: monitor.url.clone(),
                reason: e.to_string(),
            }),
        }
        if !seen.insert(monitor.url.as_str()) {
            errors.push(ValidationError::DuplicateUrl(monitor.url.clone()));
        }
        if monitor.interval_secs == 0 {
            errors.push(ValidationError::ZeroInterval(monitor.url.clone()));
        } else if monitor.interval_secs > MAX_INTERVAL_SECS {
            errors.push(ValidationError::IntervalTooLong {
                url: monitor.url.clone(),
                max: MAX_INTERVAL_SECS,
            });
        }
        if monitor.timeout_secs == 0 {
            errors.push(ValidationError::ZeroTimeout(monitor.url.clone()));
        } else if monitor.timeout_secs > MAX_TIMEOUT_SECS {
            errors.push(ValidationError::TimeoutTooLong {
                url: monitor.url.clone(),
                max: MAX_TIMEOUT_SECS,
            });
        }
    }

    for notifier in &config.notifiers {
        match notifier {
            NotifierConfig::Log => {}
            NotifierConfig::Discord { webhook } => {
                require(&mut errors, webhook, "discord notifier", "webhook");
            }
            NotifierConfig::Telegram { token, chat_id } => {
                require(&mut errors, token, "telegram notifier", "token");
                require(&mut errors, chat_id, "telegram notifier", "chat_id");
            }
        }
    }

    for sink in &config.sinks {
        match sink {
            SinkConfig::Console => {}
            SinkConfig::JsonLines { path } => require(&mut errors, path, "json_lines sink", "path"),
            SinkConfig::Sqlite { path } => require(&mut errors, path, "sqlite sink", "path"),
        }
    }

    let observability = &config.observability;
    if EnvFilter::try_new(&observability.log_level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(observability.log_level.clone()));
    }
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn require(
    errors: &mut Vec<ValidationError>,
    value: &str,
    section: &'static str,
    field: &'static str,
) {
    if value.trim().is_empty() {
        errors.push(ValidationError::EmptyField { section, field });
    }
}
