//! HTTP probing.
//!
//! # Responsibilities
//! - Issue one GET per attempt, bounded by the target's timeout
//! - Report the response status or a transport error
//!
//! Classification (only `200` is healthy) happens in the probe loop, not
//! here. No retries happen at this layer.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

use crate::health::target::TargetSpec;

/// Why a probe produced no HTTP response.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// No response within the target's timeout.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, TLS failure and similar.
    #[error("{0}")]
    Transport(String),
}

/// Performs a single probe attempt against a target.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, target: &TargetSpec) -> Result<StatusCode, ProbeError>;
}

/// Production prober backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("pulsewatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(&self, target: &TargetSpec) -> Result<StatusCode, ProbeError> {
        let response = self
            .client
            .get(&target.url)
            .timeout(target.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout(target.timeout)
                } else {
                    ProbeError::Transport(error_chain(&e))
                }
            })?;

        // Body is dropped unread; only the status matters.
        Ok(response.status())
    }
}

/// Render an error and all of its sources as `outer: inner: root`.
fn error_chain(err: &dyn StdError) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.ends_with(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
