use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Not found")]
    NotFound,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Store responded with {status}: {body}")]
    Store { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Internal server error")]
    InternalServerError,
}

impl AppError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn decode<S: Into<String>>(msg: S) -> Self {
        AppError::Decode(msg.into())
    }

    /// Failures worth another attempt: the request never reached the store,
    /// timed out, or the store reported an overload or server-side fault.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Transport(e) => e.is_connect() || e.is_timeout(),
            AppError::Store { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, AppError::Transport(e) if e.is_connect())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::BadRequest(msg) | AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Decode(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Database(e) => {
                error!("database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error occurred".to_string(),
                )
            }
            other => {
                error!("internal error: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: status.to_string(),
            message: error_message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_status_classification() {
        let overloaded = AppError::Store { status: 503, body: String::new() };
        assert!(overloaded.is_transient());

        let throttled = AppError::Store { status: 429, body: String::new() };
        assert!(throttled.is_transient());

        let rejected = AppError::Store { status: 400, body: "chat_id required".to_string() };
        assert!(!rejected.is_transient());
        assert!(!AppError::NotFound.is_transient());
    }

    #[test]
    fn test_validation_maps_to_bad_request() {
        let response = AppError::validation("text is required").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::NotFound.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
