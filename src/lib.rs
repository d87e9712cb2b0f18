//! Pulsewatch: HTTP uptime monitoring with debounced, edge-triggered alerts.

pub mod config;
pub mod dispatch;
pub mod health;
pub mod lifecycle;
pub mod observability;

#[cfg(test)]
mod test_support;

pub use config::PulsewatchConfig;
pub use dispatch::{Dispatcher, Notifier, ResultSink};
pub use health::{HealthState, ProbeResult, ProbeStatus, TargetSpec};
pub use lifecycle::{Shutdown, Watcher};
