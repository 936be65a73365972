pub mod resend;

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub reply_to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Outbound transactional email sink.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_email(&self, message: &EmailMessage) -> anyhow::Result<()>;
}
