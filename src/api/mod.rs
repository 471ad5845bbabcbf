use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, Request};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::post;
use axum::{Router, extract::State, http::StatusCode, routing::get};
use chrono::Utc;
use serde::Deserialize;

use crate::contract::{Ack, CONTRACT_HEADER, CONTRACT_VERSION, Created, REMINDERS_PATH};
use crate::db::repository;
use crate::error::AppError;
use crate::models::{MailboxId, NewReminder, Reminder, Repeat, parse_remind_at};
use crate::services::{DeliveryService, DeliveryStats};
use crate::state::AppState;

#[derive(Deserialize)]
struct MailboxQuery {
    chat_id: Option<String>,
    id: Option<i64>,
}

impl MailboxQuery {
    fn chat_id(&self) -> Result<String, AppError> {
        self.chat_id
            .as_deref()
            .and_then(MailboxId::parse)
            .map(String::from)
            .ok_or_else(|| AppError::BadRequest("chat_id required".to_string()))
    }
}

#[derive(Deserialize)]
struct CreateReminderBody {
    #[serde(default)]
    text: String,
    remind_at: Option<String>,
    repeat: Option<String>,
}

#[derive(Deserialize)]
struct UpdateReminderBody {
    id: i64,
    #[serde(default = "default_done")]
    done: bool,
}

fn default_done() -> bool {
    true
}

/// Malformed bodies get the same JSON error shape as every other failure.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

pub fn router(state: AppState) -> Router {
    let reminders = Router::new()
        .route(
            REMINDERS_PATH,
            get(list_reminders)
                .post(create_reminder)
                .put(update_reminder)
                .delete(delete_reminder),
        )
        .layer(middleware::from_fn(require_contract));

    Router::new()
        .route("/health", get(health))
        .route("/deliver", post(deliver_now))
        .merge(reminders)
        .with_state(state)
}

/// Requests that name a contract version must name the one we speak.
async fn require_contract(request: Request, next: Next) -> Result<Response, AppError> {
    if let Some(version) = request.headers().get(CONTRACT_HEADER) {
        if version.as_bytes() != CONTRACT_VERSION.as_bytes() {
            return Err(AppError::BadRequest(format!(
                "unsupported contract version {:?}, expected {}",
                version, CONTRACT_VERSION
            )));
        }
    }
    Ok(next.run(request).await)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

async fn list_reminders(
    State(state): State<AppState>,
    Query(params): Query<MailboxQuery>,
) -> Result<Json<Vec<Reminder>>, AppError> {
    let chat_id = params.chat_id()?;
    let reminders = repository::fetch_reminders(&state.db, &chat_id).await?;
    Ok(Json(reminders))
}

async fn create_reminder(
    State(state): State<AppState>,
    Query(params): Query<MailboxQuery>,
    payload: Result<Json<CreateReminderBody>, JsonRejection>,
) -> Result<Json<Created>, AppError> {
    let chat_id = params.chat_id()?;
    let body = json_body(payload)?;
    let repeat = match body.repeat.as_deref() {
        None => Repeat::default(),
        Some(raw) => raw
            .parse()
            .map_err(|_| AppError::BadRequest(format!("unknown repeat kind: {}", raw)))?,
    };
    let text = body.text.trim();
    let Some(remind_at) = body.remind_at.as_deref().filter(|_| !text.is_empty()) else {
        return Err(AppError::BadRequest("text and remind_at required".to_string()));
    };

    let req = NewReminder {
        text: text.to_string(),
        remind_at: parse_remind_at(remind_at)?,
        repeat,
    };
    let id = repository::insert_reminder(&state.db, &chat_id, &req).await?;
    tracing::info!("created reminder {} for {}", id, chat_id);
    Ok(Json(Created { id }))
}

async fn update_reminder(
    State(state): State<AppState>,
    Query(params): Query<MailboxQuery>,
    payload: Result<Json<UpdateReminderBody>, JsonRejection>,
) -> Result<Json<Ack>, AppError> {
    let chat_id = params.chat_id()?;
    let body = json_body(payload)?;
    if repository::set_done(&state.db, &chat_id, body.id, body.done).await? {
        Ok(Json(Ack::OK))
    } else {
        Err(AppError::NotFound)
    }
}

async fn delete_reminder(
    State(state): State<AppState>,
    Query(params): Query<MailboxQuery>,
) -> Result<Json<Ack>, AppError> {
    let chat_id = params.chat_id()?;
    let id = params
        .id
        .ok_or_else(|| AppError::BadRequest("id required".to_string()))?;
    repository::delete_reminder(&state.db, &chat_id, id).await?;
    Ok(Json(Ack::OK))
}

async fn deliver_now(State(state): State<AppState>) -> Result<Json<DeliveryStats>, AppError> {
    let service = DeliveryService::new(state.db.clone(), state.notifier.clone());
    let stats = service.deliver_due(Utc::now().naive_utc()).await?;
    Ok(Json(stats))
}
