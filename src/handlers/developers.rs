//! Developer HTTP handlers.
//!
//! - POST /api/developers/register - Register and receive an API key
//! - GET /api/developers/profile - Profile of the authenticated developer

use crate::{
    db::DbPool,
    error::AppError,
    extract::JsonBody,
    handlers::ApiResponse,
    middleware::auth::AuthContext,
    models::developer::{
        DeveloperProfileResponse, RegisterDeveloperRequest, RegisteredDeveloperResponse,
    },
    services::developer_service::{self, NewDeveloper},
    validation::{normalize_wallet_address, optional_trimmed},
};
use axum::{Extension, Json, extract::State, http::StatusCode};

/// Register a new developer.
///
/// # Endpoint
///
/// `POST /api/developers/register`
///
/// # Request Body
///
/// ```json
/// {
///   "wallet_address": "0x8ba1f109551bd432803012645ac136ddd64dba72",
///   "company_name": "Acme Data",
///   "email": "ops@acme.dev"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: developer id, wallet and the API key (shown once)
/// - **Error (400)**: Missing or malformed wallet address
/// - **Error (409)**: Wallet already registered
pub async fn register(
    State(pool): State<DbPool>,
    JsonBody(request): JsonBody<RegisterDeveloperRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisteredDeveloperResponse>>), AppError> {
    let wallet_address = normalize_wallet_address("wallet_address", &request.wallet_address)?;

    let email = optional_trimmed(request.email);
    if email.as_deref().is_some_and(|e| !e.contains('@')) {
        return Err(AppError::InvalidRequest(
            "email must be a valid address".to_string(),
        ));
    }

    let (developer, api_key) = developer_service::register_developer(
        &pool,
        NewDeveloper {
            wallet_address,
            company_name: optional_trimmed(request.company_name),
            email,
        },
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok(RegisteredDeveloperResponse {
            developer_id: developer.id,
            api_key,
            wallet_address: developer.wallet_address,
        }),
    ))
}

/// Profile of the authenticated developer.
///
/// # Endpoint
///
/// `GET /api/developers/profile`
///
/// # Authentication
///
/// Requires `X-API-Key`.
///
/// # Response
///
/// - **Success (200 OK)**: developer profile (never the API key itself)
/// - **Error (401)**: Missing or unknown API key
/// - **Error (404)**: Developer vanished after authentication
pub async fn profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<DeveloperProfileResponse>>, AppError> {
    let developer = developer_service::find_by_id(&pool, auth.developer_id)
        .await?
        .ok_or(AppError::DeveloperNotFound)?;

    Ok(ApiResponse::ok(developer.into()))
}
