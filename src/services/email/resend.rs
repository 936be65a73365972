use anyhow::Context;
use async_trait::async_trait;

use super::{EmailMessage, EmailProvider};

const RESEND_URL: &str = "https://api.resend.com/emails";

pub struct ResendEmailProvider {
    api_key: String,
    client: reqwest::Client,
}

impl ResendEmailProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailProvider for ResendEmailProvider {
    async fn send_email(&self, message: &EmailMessage) -> anyhow::Result<()> {
        anyhow::ensure!(!self.api_key.is_empty(), "Resend API key not configured");

        let response = self
            .client
            .post(RESEND_URL)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await
            .context("failed to reach Resend")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Resend API returned {status}: {body}");
        }

        tracing::info!(to = %message.to, subject = %message.subject, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_fails_fast() {
        let provider = ResendEmailProvider::new(String::new());
        let message = EmailMessage {
            from: "a@example.com".to_string(),
            to: "b@example.com".to_string(),
            reply_to: "a@example.com".to_string(),
            subject: "hi".to_string(),
            html: "<p>hi</p>".to_string(),
            text: "hi".to_string(),
        };
        let err = provider.send_email(&message).await.unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
