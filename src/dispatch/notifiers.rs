//! Alert notifiers.
//!
//! # Responsibilities
//! - `log`: structured warning through `tracing` (the default)
//! - `discord`: post the alert text to a webhook
//! - `telegram`: post the JSON record through the Bot API
//!
//! Webhook clients carry a fixed request timeout so a hung chat service
//! cannot stall a probe loop.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::dispatch::{Notifier, NotifyError};
use crate::health::result::ProbeResult;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(10);
const TELEGRAM_API: &str = "https://api.telegram.org";

fn webhook_client() -> Result<reqwest::Client, NotifyError> {
    let client = reqwest::Client::builder()
        .timeout(WEBHOOK_TIMEOUT)
        .user_agent(concat!("pulsewatch/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

async fn post_json<T: Serialize + ?Sized>(
    client: &reqwest::Client,
    url: &str,
    payload: &T,
) -> Result<(), NotifyError> {
    let response = client.post(url).json(payload).send().await?;
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(NotifyError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// Writes alerts to the log.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn notify(&self, result: &ProbeResult) -> Result<(), NotifyError> {
        tracing::warn!(
            url = %result.url,
            status = %result.status,
            latency_ms = result.latency_ms,
            message = %result.message,
            "Target health changed"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct DiscordPayload<'a> {
    username: &'a str,
    content: String,
}

/// Posts alert text to a Discord webhook.
#[derive(Debug, Clone)]
pub struct DiscordNotifier {
    webhook: String,
    client: reqwest::Client,
}

impl DiscordNotifier {
    pub fn new(webhook: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            webhook: webhook.into(),
            client: webhook_client()?,
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn notify(&self, result: &ProbeResult) -> Result<(), NotifyError> {
        let payload = DiscordPayload {
            username: "Pulsewatch",
            content: result.alert_text(),
        };
        post_json(&self.client, &self.webhook, &payload).await
    }
}

#[derive(Serialize)]
struct TelegramPayload<'a> {
    chat_id: &'a str,
    text: String,
}

/// Sends the JSON record to a Telegram chat through the Bot API.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    api_base: String,
    token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            api_base: TELEGRAM_API.to_string(),
            token: token.into(),
            chat_id: chat_id.into(),
            client: webhook_client()?,
        })
    }

    /// Point the notifier at a different Bot API host.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.api_base.trim_end_matches('/'),
            self.token
        )
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn notify(&self, result: &ProbeResult) -> Result<(), NotifyError> {
        let payload = TelegramPayload {
            chat_id: &self.chat_id,
            text: result.to_json()?,
        };
        post_json(&self.client, &self.endpoint(), &payload).await
    }
}
