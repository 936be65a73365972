pub mod twilio;

use async_trait::async_trait;

/// Outbound SMS sink.
#[async_trait]
pub trait MessagingProvider: Send + Sync {
    async fn send_message(&self, to: &str, body: &str) -> anyhow::Result<()>;
}

/// Normalizes a visitor-entered number to E.164, assuming North America
/// when no `+` country prefix is given.
pub fn format_phone(raw: &str) -> String {
    let raw = raw.trim();
    if raw.starts_with('+') {
        return raw.to_string();
    }
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("+1{digits}")
}
