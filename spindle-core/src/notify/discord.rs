//! Discord webhook notification sink: posts a plain-text message to an
//! incoming webhook URL.

use async_trait::async_trait;
use reqwest::Client;

use super::NotificationSink;

pub struct DiscordSink {
    client: Client,
    webhook_url: String,
}

impl DiscordSink {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            webhook_url: webhook_url.into(),
        }
    }
}

#[async_trait]
impl NotificationSink for DiscordSink {
    async fn notify(&self, message: &str) {
        let body = serde_json::json!({ "content": message });
        if let Err(err) = self.client.post(&self.webhook_url).json(&body).send().await {
            tracing::warn!(error = %err, "failed to deliver discord notification");
        }
    }
}
