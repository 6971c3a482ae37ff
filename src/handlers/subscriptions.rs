//! Subscription plan HTTP handlers.
//!
//! - POST /api/subscriptions/plans - Create a plan (developer only)
//! - GET /api/subscriptions/plans - List the caller's active plans
//! - GET /api/subscriptions/plans/:id - Public plan lookup
//! - DELETE /api/subscriptions/plans/:id - Deactivate a plan (owner only)

use crate::{
    db::DbPool,
    error::AppError,
    extract::{JsonBody, PathParam},
    handlers::ApiResponse,
    middleware::auth::AuthContext,
    models::subscription_plan::{CreatePlanRequest, PlanResponse},
    services::subscription_service,
};
use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
};
use uuid::Uuid;

/// Create a subscription plan.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Weather API",
///   "description": "Hourly forecasts",
///   "price_per_call": "0.001",
///   "daily_cap": "0.5",
///   "monthly_cap": "10"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: the created plan
/// - **Error (400)**: Missing name/price, non-positive price, negative cap
/// - **Error (401)**: Missing or unknown API key
pub async fn create_plan(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    JsonBody(request): JsonBody<CreatePlanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PlanResponse>>), AppError> {
    let new_plan = subscription_service::validate_new_plan(request)?;
    let plan = subscription_service::create_plan(&pool, auth.developer_id, new_plan).await?;

    Ok((StatusCode::CREATED, ApiResponse::ok(plan.into())))
}

/// List the authenticated developer's active plans, newest first.
pub async fn list_plans(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ApiResponse<Vec<PlanResponse>>>, AppError> {
    let plans = subscription_service::list_plans_for_developer(&pool, auth.developer_id).await?;

    Ok(ApiResponse::ok(plans.into_iter().map(Into::into).collect()))
}

/// Look up any plan by id.
///
/// Consumers use this to see price and caps before paying. Inactive plans
/// are still returned, flagged `is_active: false`.
///
/// # Response
///
/// - **Success (200 OK)**: the plan
/// - **Error (400)**: id is not a UUID
/// - **Error (404)**: no plan with this id
pub async fn get_plan(
    State(pool): State<DbPool>,
    PathParam(plan_id): PathParam<Uuid>,
) -> Result<Json<ApiResponse<PlanResponse>>, AppError> {
    let plan = subscription_service::get_plan(&pool, plan_id)
        .await?
        .ok_or(AppError::PlanNotFound)?;

    Ok(ApiResponse::ok(plan.into()))
}

/// Deactivate one of the caller's plans (soft delete).
///
/// Returns 204 No Content, or 404 if the plan is unknown, already inactive,
/// or owned by another developer.
pub async fn deactivate_plan(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    PathParam(plan_id): PathParam<Uuid>,
) -> Result<StatusCode, AppError> {
    subscription_service::deactivate_plan(&pool, auth.developer_id, plan_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
