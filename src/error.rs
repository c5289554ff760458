use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use crate::domain::models::UnknownVariant;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },
    #[error("Payment processor error: {0}")]
    Upstream(String),
    #[error("Internal server error")]
    Internal,
    #[error("Internal server error: {0}")]
    InternalWithMsg(String),
}

impl AppError {
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        AppError::Validation { field: field.to_string(), reason: reason.into() }
    }
}

impl From<UnknownVariant> for AppError {
    fn from(err: UnknownVariant) -> Self {
        AppError::InternalWithMsg(err.to_string())
    }
}

// 2067 = SQLite unique constraint
// 23505 = PostgreSQL unique violation
// 23P01 = PostgreSQL exclusion violation
// 40001 = PostgreSQL serialization failure
fn is_conflict_code(code: &str) -> bool {
    matches!(code, "2067" | "23505" | "23P01" | "40001")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                if let Some(db_err) = e.as_database_error() {
                    let code = db_err.code().unwrap_or_default();
                    if is_conflict_code(&code) {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "error": "Conflicting booking or duplicate entry" }))
                        ).into_response();
                    }
                }

                error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Validation { field, reason } => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({ "error": reason, "field": field }))
                ).into_response();
            }
            AppError::Upstream(msg) => {
                error!("Payment processor error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Payment processor unavailable".to_string())
            }
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

/// Converts a database error raised by the exclusion constraint or a
/// serialization failure into a booking conflict.
pub fn conflict_on_overlap(err: sqlx::Error) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if is_conflict_code(&db_err.code().unwrap_or_default()) {
            return AppError::Conflict("Requested window overlaps an existing booking".into());
        }
    }
    AppError::Database(err)
}
