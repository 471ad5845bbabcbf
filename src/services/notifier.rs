use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::info;

use crate::error::AppError;

/// Channel that carries a fired reminder to its mailbox.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, chat_id: &str, text: &str) -> Result<(), AppError>;
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: String,
    parse_mode: &'static str,
}

/// Telegram Bot API `sendMessage`; the mailbox id is the chat id.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramNotifier {
    pub fn new(token: impl Into<String>) -> Result<Self, AppError> {
        Self::with_api_base("https://api.telegram.org", token)
    }

    pub fn with_api_base(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
        })
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, chat_id: &str, text: &str) -> Result<(), AppError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base.trim_end_matches('/'), self.token);
        let request_body = SendMessageRequest {
            chat_id,
            text: format!("🔔 <b>Reminder</b>\n\n{}", escape_html(text)),
            parse_mode: "HTML",
        };

        let response = self.client
            .post(&url)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::Delivery(format!("Telegram request failed: {}", e.without_url())))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Delivery(format!("Telegram API error {}: {}", status, body)));
        }

        Ok(())
    }
}

/// Writes reminders to the log instead of sending them anywhere.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, chat_id: &str, text: &str) -> Result<(), AppError> {
        info!("reminder for {}: {}", chat_id, text);
        Ok(())
    }
}
