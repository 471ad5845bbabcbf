use std::env;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::error::AppError;
use crate::services::{LogNotifier, Notifier, TelegramNotifier};

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    /// Seconds between delivery passes; 0 turns the scheduler off.
    pub delivery_interval_secs: u64,
    pub telegram_bot_token: Option<String>,
}

impl ServerConfig {
    pub fn new_from_env() -> Result<Self, AppError> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://reminders.db?mode=rwc".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:3000".to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AppError::Config(format!("BIND_ADDR is not a socket address: {}", e)))?;

        let delivery_interval_secs = match env::var("DELIVERY_INTERVAL_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .map_err(|_| AppError::Config(format!("DELIVERY_INTERVAL_SECS is not a number: {}", raw)))?,
            Err(_) => 60,
        };

        let telegram_bot_token = env::var("TELEGRAM_BOT_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());

        Ok(Self {
            database_url,
            bind_addr,
            delivery_interval_secs,
            telegram_bot_token,
        })
    }

    pub fn notifier(&self) -> Result<Arc<dyn Notifier>, AppError> {
        match &self.telegram_bot_token {
            Some(token) => Ok(Arc::new(TelegramNotifier::new(token.clone())?)),
            None => Ok(Arc::new(LogNotifier)),
        }
    }
}
