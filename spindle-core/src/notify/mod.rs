//! Fire-and-forget notification sinks.

pub mod discord;

use async_trait::async_trait;

/// A chat-webhook-style notification sink. Failures are logged, never
/// propagated — notifications are best-effort by design.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, message: &str);
}

/// No-op sink used when no webhook is configured.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn notify(&self, message: &str) {
        tracing::debug!(%message, "notification sink not configured, dropping");
    }
}
