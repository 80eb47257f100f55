//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use taskboard_core::{CoreError, Transient};

use crate::auth::AuthError;
use crate::db::DbError;
use crate::models::ValidationError;

/// Seconds a client should wait before retrying a 503.
const RETRY_AFTER_SECS: &str = "1";

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Missing or bad credentials (401)
    Unauthorized { reason: &'static str },

    /// Move destination the user does not own (403)
    Forbidden { resource: &'static str, id: String },

    /// Resource not found, or not the user's (404)
    NotFound { resource: &'static str, id: String },

    /// Uniqueness conflict (409)
    Conflict { message: String },

    /// Lock contention outlasted the retries (503, retryable)
    Transient,

    /// Database error (500, logged)
    Database(DbError),

    /// Internal error (500)
    Internal { message: String },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::Unauthorized { reason } => (
                StatusCode::UNAUTHORIZED,
                json!({
                    "error": "unauthorized",
                    "message": reason
                }),
            ),
            Self::Forbidden { resource, id } => (
                StatusCode::FORBIDDEN,
                json!({
                    "error": "forbidden",
                    "message": format!("{} '{}' is not accessible", resource, id)
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict { message } => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": message
                }),
            ),
            Self::Transient => {
                tracing::warn!("request gave up after repeated lock contention");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    json!({
                        "error": "transient",
                        "message": "the resource is busy, retry shortly"
                    }),
                )
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
            Self::Internal { message } => {
                tracing::error!("Internal error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::Transient) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
        }
        response
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        if e.is_transient() {
            return Self::Transient;
        }
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Forbidden { resource, id } => Self::Forbidden { resource, id },
            DbError::Conflict(message) => Self::Conflict { message },
            DbError::Position(CoreError::InvalidPosition { value, .. }) => {
                Self::Validation(ValidationError::InvalidPosition {
                    field: "position",
                    value,
                })
            }
            DbError::Position(overflow @ CoreError::PositionOverflow { .. }) => Self::Conflict {
                message: overflow.to_string(),
            },
            _ => Self::Database(e),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        Self::Internal {
            message: e.to_string(),
        }
    }
}
