//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated configuration into targets and collaborators
//! - Apply the defaults: console sink, log notifier
//!
//! # Design Decisions
//! - Fail fast: any collaborator that cannot be built aborts startup
//!   before a single probe runs

use std::sync::Arc;

use thiserror::Error;

use crate::config::{NotifierConfig, PulsewatchConfig, SinkConfig};
use crate::dispatch::notifiers::{DiscordNotifier, LogNotifier, TelegramNotifier};
use crate::dispatch::sinks::{ConsoleSink, JsonLinesSink, SqliteSink};
use crate::dispatch::{Dispatcher, Notifier, NotifyError, ResultSink, SinkError};
use crate::health::probe::HttpProber;
use crate::health::target::TargetSpec;
use crate::lifecycle::watcher::Watcher;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to build notifier: {0}")]
    Notifier(#[from] NotifyError),

    #[error("failed to open result sink: {0}")]
    Sink(#[from] SinkError),
}

pub fn build_notifiers(configs: &[NotifierConfig]) -> Result<Vec<Arc<dyn Notifier>>, NotifyError> {
    if configs.is_empty() {
        return Ok(vec![Arc::new(LogNotifier)]);
    }

    let mut notifiers: Vec<Arc<dyn Notifier>> = Vec::with_capacity(configs.len());
    for config in configs {
        match config {
            NotifierConfig::Log => notifiers.push(Arc::new(LogNotifier)),
            NotifierConfig::Discord { webhook } => {
                notifiers.push(Arc::new(DiscordNotifier::new(webhook.clone())?));
            }
            NotifierConfig::Telegram { token, chat_id } => {
                notifiers.push(Arc::new(TelegramNotifier::new(token.clone(), chat_id.clone())?));
            }
        }
    }
    Ok(notifiers)
}

pub async fn build_sinks(configs: &[SinkConfig]) -> Result<Vec<Arc<dyn ResultSink>>, SinkError> {
    if configs.is_empty() {
        return Ok(vec![Arc::new(ConsoleSink::new())]);
    }

    let mut sinks: Vec<Arc<dyn ResultSink>> = Vec::with_capacity(configs.len());
    for config in configs {
        match config {
            SinkConfig::Console => sinks.push(Arc::new(ConsoleSink::new())),
            SinkConfig::JsonLines { path } => sinks.push(Arc::new(JsonLinesSink::open(path).await?)),
            SinkConfig::Sqlite { path } => sinks.push(Arc::new(SqliteSink::open(path).await?)),
        }
    }
    Ok(sinks)
}

/// Build a ready-to-start watcher from a validated configuration.
pub async fn build_watcher(config: &PulsewatchConfig) -> Result<Watcher, StartupError> {
    let prober = Arc::new(HttpProber::new()?);
    let notifiers = build_notifiers(&config.notifiers)?;
    let sinks = build_sinks(&config.sinks).await?;

    tracing::info!(
        monitors = config.monitors.len(),
        notifiers = notifiers.len(),
        sinks = sinks.len(),
        "Collaborators initialized"
    );

    let targets = config.monitors.iter().map(TargetSpec::from).collect();
    Ok(Watcher::new(targets, prober, Dispatcher::new(notifiers, sinks)))
}
