//! Monitored targets.
//!
//! A [`TargetSpec`] is the immutable configuration of an endpoint and is
//! shared between restarts of its probe loop. A [`Target`] pairs it with
//! runtime health that only the owning loop ever touches.

use std::sync::Arc;
use std::time::Duration;

use crate::config::MonitorConfig;
use crate::health::state::{advance, HealthState, Outcome, Transition};

/// Immutable configuration of a monitored endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetSpec {
    /// Endpoint URL, also the target's identity.
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Consecutive failures tolerated before an outage is confirmed.
    pub retry_budget: u32,
    /// Time between the starts of two probe attempts.
    pub interval: Duration,
}

impl TargetSpec {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(5),
            retry_budget: 2,
            interval: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = retry_budget;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

impl From<&MonitorConfig> for TargetSpec {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            url: config.url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            retry_budget: config.retry,
            interval: Duration::from_secs(config.interval_secs),
        }
    }
}

/// A target and its runtime health.
#[derive(Debug)]
pub struct Target {
    spec: Arc<TargetSpec>,
    state: HealthState,
    consecutive_failures: u32,
}

impl Target {
    /// A fresh target in `Init` with a zero failure counter.
    pub fn new(spec: Arc<TargetSpec>) -> Self {
        Self {
            spec,
            state: HealthState::Init,
            consecutive_failures: 0,
        }
    }

    pub fn spec(&self) -> &Arc<TargetSpec> {
        &self.spec
    }

    pub fn url(&self) -> &str {
        &self.spec.url
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Feed one classified outcome into the state machine.
    pub fn observe(&mut self, outcome: Outcome) -> Transition {
        let transition = advance(
            self.state,
            self.consecutive_failures,
            self.spec.retry_budget,
            outcome,
        );
        self.state = transition.to;
        self.consecutive_failures = transition.failures;
        transition
    }
}
