use std::sync::Arc;

use sqlx::SqlitePool;

use crate::services::Notifier;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub notifier: Arc<dyn Notifier>,
}
