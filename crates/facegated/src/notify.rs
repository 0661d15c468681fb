//! Guardian notification via the messaging gateway.
//!
//! The gateway wraps the actual WhatsApp delivery; this side is a single
//! fire-and-forget POST, bounded by a request timeout so a wedged gateway
//! cannot stall the recognition loop.

use anyhow::Context;
use facegate_core::Notifier;
use std::time::Duration;

pub struct GatewayNotifier {
    client: reqwest::blocking::Client,
    url: String,
}

impl GatewayNotifier {
    pub fn new(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("building notification http client")?;
        Ok(Self { client, url: url.to_string() })
    }
}

impl Notifier for GatewayNotifier {
    fn send(&self, text: &str, contact: &str) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "to": contact, "text": text }))
            .send()
            .context("posting to notification gateway")?;
        response
            .error_for_status()
            .context("notification gateway rejected the message")?;
        Ok(())
    }
}

/// Used when no gateway is configured; marking proceeds, messages are
/// logged and dropped.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn send(&self, text: &str, contact: &str) -> anyhow::Result<()> {
        tracing::info!(contact, text, "notification gateway disabled; message dropped");
        Ok(())
    }
}
