pub mod memory;
pub mod retry;

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use tracing::{debug, warn};

use crate::contract::{CONTRACT_HEADER, CONTRACT_VERSION, REMINDERS_PATH};
use crate::error::AppError;
use crate::models::{MailboxId, NewReminder, Reminder, UpdateReminderRequest};

pub use memory::InMemoryReminderStore;
pub use retry::RetryPolicy;

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl StoreConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("REMINDERS_API_URL")
            .map_err(|_| AppError::Config("REMINDERS_API_URL is not set".to_string()))?;
        let mut config = Self::new(base_url);

        if let Ok(raw) = env::var("REMINDERS_API_TIMEOUT_SECS") {
            let secs = raw
                .parse::<u64>()
                .map_err(|_| AppError::Config(format!("REMINDERS_API_TIMEOUT_SECS is not a number: {}", raw)))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Ok(raw) = env::var("REMINDERS_API_RETRIES") {
            let attempts = raw
                .parse::<u32>()
                .map_err(|_| AppError::Config(format!("REMINDERS_API_RETRIES is not a number: {}", raw)))?;
            config.retry.max_attempts = attempts.max(1);
        }

        Ok(config)
    }
}

/// Remote authoritative store, every call scoped to one mailbox.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn list(&self, mailbox: &MailboxId) -> Result<Vec<Reminder>, AppError>;
    async fn create(&self, mailbox: &MailboxId, reminder: &NewReminder) -> Result<(), AppError>;
    async fn update(&self, mailbox: &MailboxId, request: &UpdateReminderRequest) -> Result<(), AppError>;
    /// Deleting an id the store no longer has succeeds.
    async fn delete(&self, mailbox: &MailboxId, id: i64) -> Result<(), AppError>;
}

pub struct ReminderHttpClient {
    client: Client,
    config: StoreConfig,
}

impl ReminderHttpClient {
    pub fn new(config: StoreConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, mailbox: &MailboxId, id: Option<i64>) -> Result<Url, AppError> {
        let base = self.config.base_url.trim_end_matches('/');
        let mut params = vec![("chat_id", mailbox.as_str().to_string())];
        if let Some(id) = id {
            params.push(("id", id.to_string()));
        }

        Url::parse_with_params(&format!("{}{}", base, REMINDERS_PATH), &params)
            .map_err(|e| AppError::Config(format!("Invalid store url {}: {}", base, e)))
    }

    async fn execute<F>(&self, op: &str, idempotent: bool, build: F) -> Result<Response, AppError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let build = &build;
        self.config
            .retry
            .run(op, idempotent, move || async move {
                let response = build()
                    .header(CONTRACT_HEADER, CONTRACT_VERSION)
                    .send()
                    .await?;
                check_status(response).await
            })
            .await
    }
}

async fn check_status(response: Response) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound);
    }

    let body = response.text().await.unwrap_or_default();
    Err(AppError::Store {
        status: status.as_u16(),
        body,
    })
}

/// Decodes a list body. A body that is not an array is an error; elements
/// that do not fit the reminder shape are dropped with a warning.
pub fn decode_reminder_list(body: serde_json::Value) -> Result<Vec<Reminder>, AppError> {
    let serde_json::Value::Array(items) = body else {
        return Err(AppError::decode("list response is not an array"));
    };

    let mut reminders = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<Reminder>(item) {
            Ok(reminder) if reminder.text.trim().is_empty() => {
                warn!("Skipping reminder {} with blank text", reminder.id);
            }
            Ok(reminder) => reminders.push(reminder),
            Err(e) => {
                warn!("Failed to parse reminder from store: {}", e);
            }
        }
    }
    Ok(reminders)
}

#[async_trait]
impl ReminderStore for ReminderHttpClient {
    async fn list(&self, mailbox: &MailboxId) -> Result<Vec<Reminder>, AppError> {
        let url = self.endpoint(mailbox, None)?;
        let response = self.execute("list", true, || self.client.get(url.clone())).await?;

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::decode(format!("Failed to parse list response: {}", e)))?;
        let reminders = decode_reminder_list(body)?;
        debug!("listed {} reminders for {}", reminders.len(), mailbox);
        Ok(reminders)
    }

    async fn create(&self, mailbox: &MailboxId, reminder: &NewReminder) -> Result<(), AppError> {
        let url = self.endpoint(mailbox, None)?;
        self.execute("create", false, || self.client.post(url.clone()).json(reminder))
            .await?;
        Ok(())
    }

    async fn update(&self, mailbox: &MailboxId, request: &UpdateReminderRequest) -> Result<(), AppError> {
        let url = self.endpoint(mailbox, None)?;
        self.execute("update", true, || self.client.put(url.clone()).json(request))
            .await?;
        Ok(())
    }

    async fn delete(&self, mailbox: &MailboxId, id: i64) -> Result<(), AppError> {
        let url = self.endpoint(mailbox, Some(id))?;
        match self.execute("delete", true, || self.client.delete(url.clone())).await {
            Ok(_) | Err(AppError::NotFound) => Ok(()),
            Err(e) => Err(e),
        }
    }
}
