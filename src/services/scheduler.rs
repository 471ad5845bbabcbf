use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use crate::services::delivery::DeliveryService;
use crate::services::notifier::Notifier;

/// Runs a delivery pass on a fixed interval.
pub struct DeliveryScheduler {
    service: DeliveryService,
    interval: Duration,
}

impl DeliveryScheduler {
    pub fn new(db: SqlitePool, notifier: Arc<dyn Notifier>, interval_secs: u64) -> Self {
        Self {
            service: DeliveryService::new(db, notifier),
            interval: Duration::from_secs(interval_secs),
        }
    }

    pub async fn start(self) {
        info!("Starting delivery scheduler (interval: {:?})", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;

            // due moments are compared against UTC wall clock, as the store records them
            let now = Utc::now().naive_utc();
            match self.service.deliver_due(now).await {
                Ok(stats) => debug!("Delivery pass finished: {:?}", stats),
                Err(e) => warn!("Delivery pass failed: {}", e),
            }
        }
    }
}
