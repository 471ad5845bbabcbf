use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::format_remind_at;
use crate::services::notifier::Notifier;

/// Most reminders handled in one pass.
pub const DELIVERY_BATCH: i64 = 50;

pub struct DeliveryService {
    db: SqlitePool,
    notifier: Arc<dyn Notifier>,
}

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct DeliveryStats {
    pub checked: usize,
    pub sent: usize,
    pub failed: usize,
    pub checked_at: String,
}

impl DeliveryService {
    pub fn new(db: SqlitePool, notifier: Arc<dyn Notifier>) -> Self {
        Self { db, notifier }
    }

    /// Notifies every reminder due at `now`. One-shot reminders are marked
    /// sent; recurring ones move to their next due moment. A reminder whose
    /// notification fails stays untouched and is picked up again next pass.
    /// A failure on one reminder never stops the rest of the batch.
    pub async fn deliver_due(&self, now: NaiveDateTime) -> Result<DeliveryStats, AppError> {
        let due = repository::fetch_due(&self.db, now, DELIVERY_BATCH).await?;
        let mut stats = DeliveryStats {
            checked_at: format_remind_at(&now),
            ..DeliveryStats::default()
        };

        for item in due {
            let reminder = &item.reminder;
            if !reminder.is_due(now) {
                continue;
            }
            stats.checked += 1;
            if let Err(e) = self.notifier.notify(&item.chat_id, &reminder.text).await {
                warn!("Failed to send reminder {}: {}", reminder.id, e);
                stats.failed += 1;
                continue;
            }

            let advanced = match reminder.repeat.next_after(reminder.remind_at) {
                Some(next) => repository::reschedule(&self.db, reminder.id, next).await,
                None => repository::mark_sent(&self.db, reminder.id).await,
            };
            if let Err(e) = advanced {
                warn!("Sent reminder {} but failed to record it: {}", reminder.id, e);
                stats.failed += 1;
                continue;
            }
            stats.sent += 1;
        }

        if stats.checked > 0 {
            info!("Delivery pass: {} due, {} sent, {} failed", stats.checked, stats.sent, stats.failed);
        }
        Ok(stats)
    }
}
