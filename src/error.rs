use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Event not found")]
    EventNotFound,
    #[error("Event has been cancelled")]
    EventCancelled,
    #[error("Already RSVP'd ({0})")]
    AlreadyRsvpd(String),
    #[error("No active RSVP to cancel")]
    NoActiveRsvp,
    #[error("Transaction conflict")]
    TransactionConflict,
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

// 2067 = SQLite unique constraint, 1555 = SQLite primary key, 23505 = PostgreSQL unique violation
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        let code = db_err.code().unwrap_or_default();
        return code == "2067" || code == "1555" || code == "23505";
    }
    false
}

// 40001/40P01 = Postgres serialization failure / deadlock,
// 5/6/261/517 = SQLite busy / locked variants surfaced when a write could not be serialized
pub fn is_serialization_conflict(e: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        let code = db_err.code().unwrap_or_default();
        return code == "40001" || code == "40P01"
            || code == "5" || code == "6" || code == "261" || code == "517";
    }
    matches!(e, sqlx::Error::PoolTimedOut)
}

pub fn map_tx_err(e: sqlx::Error) -> AppError {
    if is_serialization_conflict(&e) {
        AppError::TransactionConflict
    } else {
        AppError::Database(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();

                    // 2067 = SQLite Unique Constraint
                    // 23505 = PostgreSQL Unique Violation
                    if code == "2067" || code == "23505" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Resource already exists (duplicate entry)" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::EventNotFound => (StatusCode::NOT_FOUND, "Event not found".to_string()),
            AppError::EventCancelled => (StatusCode::GONE, "Event has been cancelled".to_string()),
            AppError::AlreadyRsvpd(current_status) => {
                return (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "error": "Already RSVP'd to this event",
                        "status": current_status
                    }))
                ).into_response();
            }
            AppError::NoActiveRsvp => (StatusCode::CONFLICT, "No active RSVP to cancel".to_string()),
            AppError::TransactionConflict => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Temporary conflict, please retry".to_string()
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string()),
            AppError::InternalWithMsg(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
