//! HTTP request handlers (route handlers).
//!
//! Each handler validates its input, delegates to a service and wraps the
//! result in the `{ "success": true, "data": ... }` envelope.

use axum::{
    Json,
    http::{StatusCode, Uri},
};
use serde::Serialize;
use serde_json::{Value, json};

/// Developer registration and profile
pub mod developers;
/// Service health
pub mod health;
/// x402 access checks, verification and usage
pub mod payments;
/// Subscription plan management
pub mod subscriptions;

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data,
        })
    }
}

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "code": "not_found",
                "message": format!("Endpoint not found: {}", uri.path())
            }
        })),
    )
}
