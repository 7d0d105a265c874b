//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Wallet balance cannot cover the requested debit
    #[error("Insufficient token balance")]
    InsufficientFunds,

    /// The caller already voted in this competition
    #[error("You have already voted in this competition")]
    AlreadyVoted,

    /// The selected image does not belong to the competition
    #[error("Selected image does not belong to this competition")]
    InvalidSelection,

    /// Unauthorized access
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing resource, named for the message
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Anything else that went wrong server-side
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::InsufficientFunds
            | ApiError::AlreadyVoted
            | ApiError::InvalidSelection => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(resource) => {
                (StatusCode::NOT_FOUND, format!("{resource} not found"))
            }
            ApiError::Database(ref e) => {
                if let Some(msg) = constraint_message(e) {
                    (StatusCode::BAD_REQUEST, msg.to_string())
                } else {
                    tracing::error!("Database error: {}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            }
            ApiError::Internal(ref e) => {
                // Repository errors arrive wrapped in anyhow; constraint
                // violations inside them are still client mistakes.
                if let Some(msg) = e.downcast_ref::<sqlx::Error>().and_then(constraint_message) {
                    (StatusCode::BAD_REQUEST, msg.to_string())
                } else {
                    tracing::error!("Internal error: {:#}", e);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "Internal server error".to_string(),
                    )
                }
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Client-facing message for constraint violations the schema turns into
/// database errors, None for everything genuinely internal
fn constraint_message(e: &sqlx::Error) -> Option<&'static str> {
    let db = match e {
        sqlx::Error::Database(db) => db,
        _ => return None,
    };

    if db.is_unique_violation() {
        Some("A record with those unique fields already exists")
    } else if db.is_foreign_key_violation() {
        Some("A referenced record does not exist or is still referenced")
    } else {
        None
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
