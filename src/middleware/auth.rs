//! Developer API key authentication middleware.
//!
//! This middleware intercepts every developer-only request to:
//! 1. Extract the API key from the `X-API-Key` header
//! 2. Hash it and look up the owning developer
//! 3. Inject authentication context into the request
//! 4. Reject unauthenticated requests with HTTP 401

use crate::{db::DbPool, error::AppError, services::developer_service};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

/// Header carrying the developer's API key.
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Authentication context attached to authenticated requests.
///
/// Handlers extract it with `Extension<AuthContext>`.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Used to scope queries to the caller's own plans
    pub developer_id: Uuid,
}

/// API key authentication middleware function.
///
/// # Flow
///
/// 1. Read `X-API-Key: pn_...`; missing or blank → 401 `api_key_required`
/// 2. Hash the key with SHA-256 and look it up
/// 3. Unknown key → 401 `invalid_api_key`
/// 4. Inject `AuthContext` and call the next handler
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(AppError::MissingApiKey)?;

    let developer = developer_service::find_by_api_key(&pool, api_key)
        .await?
        .ok_or(AppError::InvalidApiKey)?;

    request.extensions_mut().insert(AuthContext {
        developer_id: developer.id,
    });

    Ok(next.run(request).await)
}
