//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::db::is_unique_violation;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Missing or unknown API keys
/// - **Resource Errors**: Requested developer or plan not found
/// - **Conflict Errors**: Duplicate wallet registration, reused payment hash
/// - **Upstream Errors**: The blockchain RPC node failed or misbehaved
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// `X-API-Key` header is absent.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("API key required")]
    MissingApiKey,

    /// `X-API-Key` header does not match any developer.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Returns HTTP 404 Not Found.
    #[error("Developer not found")]
    DeveloperNotFound,

    /// Plan does not exist, is inactive, or belongs to another developer.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Subscription plan not found")]
    PlanNotFound,

    /// A unique constraint was hit (wallet already registered, hash already used).
    ///
    /// Returns HTTP 409 Conflict.
    #[error("{0}")]
    Conflict(String),

    /// The blockchain RPC node could not be reached or returned an error.
    ///
    /// Returns HTTP 502 Bad Gateway.
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Unique violations become conflicts, everything else stays a database error.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if is_unique_violation(&err) {
            AppError::Conflict("Resource already exists".to_string())
        } else {
            AppError::Database(err)
        }
    }
}

/// Extractor rejections (malformed JSON, wrong field types, missing
/// `Content-Type`, bad path or query values) are client input errors.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::InvalidRequest(rejection.body_text())
    }
}

impl AppError {
    /// HTTP status and machine-readable code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::MissingApiKey => (StatusCode::UNAUTHORIZED, "api_key_required"),
            AppError::InvalidApiKey => (StatusCode::UNAUTHORIZED, "invalid_api_key"),
            AppError::DeveloperNotFound => (StatusCode::NOT_FOUND, "developer_not_found"),
            AppError::PlanNotFound => (StatusCode::NOT_FOUND, "plan_not_found"),
            AppError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
            AppError::Rpc(_) => (StatusCode::BAD_GATEWAY, "rpc_unavailable"),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            AppError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// Database and RPC failures are logged in full and reported to the client
/// with a generic message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            AppError::InvalidRequest(msg) | AppError::Conflict(msg) => msg.clone(),
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                "An internal error occurred".to_string()
            }
            AppError::Rpc(detail) => {
                tracing::error!(%detail, "blockchain RPC failure");
                "Blockchain node unavailable".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
