use async_trait::async_trait;
use tracing::info;

use crate::outcome::Outcome;

/// Outbound e-mail delivery.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Outcome<()>;
}

/// Development sink: writes messages to the log instead of delivering them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailer;

#[async_trait]
impl EmailSender for LogMailer {
    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Outcome<()> {
        info!(to, subject, body_len = html_body.len(), "email queued to log sink");
        Ok(())
    }
}
