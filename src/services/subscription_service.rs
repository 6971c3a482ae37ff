//! Subscription plan service.

use crate::{
    db::DbPool,
    error::AppError,
    models::subscription_plan::{CreatePlanRequest, NewPlan, SubscriptionPlan},
    validation::optional_trimmed,
};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Largest number of fractional digits an AVAX amount can carry (wei precision).
pub const MAX_AMOUNT_SCALE: u32 = 18;

/// Integer digits left by `NUMERIC(38,18)`.
pub const MAX_AMOUNT_INTEGER_DIGITS: u32 = 20;

/// Validate a plan creation request.
///
/// # Rules
///
/// - `name` is required (non-blank)
/// - `price_per_call` is required and strictly positive
/// - caps, when present, are zero or positive
/// - amounts carry at most 18 decimal places
pub fn validate_new_plan(request: CreatePlanRequest) -> Result<NewPlan, AppError> {
    let name = request.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::InvalidRequest(
            "Name and price_per_call are required".to_string(),
        ));
    }

    let price_per_call = request.price_per_call.ok_or_else(|| {
        AppError::InvalidRequest("Name and price_per_call are required".to_string())
    })?;

    if price_per_call <= Decimal::ZERO {
        return Err(AppError::InvalidRequest(
            "price_per_call must be positive".to_string(),
        ));
    }
    check_scale("price_per_call", price_per_call)?;

    for (field, cap) in [
        ("daily_cap", request.daily_cap),
        ("monthly_cap", request.monthly_cap),
    ] {
        if let Some(cap) = cap {
            if cap < Decimal::ZERO {
                return Err(AppError::InvalidRequest(format!(
                    "{field} cannot be negative"
                )));
            }
            check_scale(field, cap)?;
        }
    }

    Ok(NewPlan {
        name,
        description: optional_trimmed(request.description),
        price_per_call,
        daily_cap: request.daily_cap,
        monthly_cap: request.monthly_cap,
    })
}

fn check_scale(field: &str, amount: Decimal) -> Result<(), AppError> {
    if amount.normalize().scale() > MAX_AMOUNT_SCALE {
        return Err(AppError::InvalidRequest(format!(
            "{field} supports at most {MAX_AMOUNT_SCALE} decimal places"
        )));
    }

    let limit = Decimal::from_i128_with_scale(10i128.pow(MAX_AMOUNT_INTEGER_DIGITS), 0);
    if amount.abs() >= limit {
        return Err(AppError::InvalidRequest(format!(
            "{field} supports at most {MAX_AMOUNT_INTEGER_DIGITS} integer digits"
        )));
    }
    Ok(())
}

/// Create a subscription plan owned by `developer_id`.
pub async fn create_plan(
    pool: &DbPool,
    developer_id: Uuid,
    plan: NewPlan,
) -> Result<SubscriptionPlan, AppError> {
    let plan = sqlx::query_as::<_, SubscriptionPlan>(
        r#"
        INSERT INTO subscription_plans
            (developer_id, name, description, price_per_call, daily_cap, monthly_cap)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(developer_id)
    .bind(plan.name)
    .bind(plan.description)
    .bind(plan.price_per_call)
    .bind(plan.daily_cap)
    .bind(plan.monthly_cap)
    .fetch_one(pool)
    .await?;

    tracing::info!(plan_id = %plan.id, %developer_id, price = %plan.price_per_call, "subscription plan created");

    Ok(plan)
}

/// Active plans of a developer, newest first.
pub async fn list_plans_for_developer(
    pool: &DbPool,
    developer_id: Uuid,
) -> Result<Vec<SubscriptionPlan>, AppError> {
    let plans = sqlx::query_as::<_, SubscriptionPlan>(
        "SELECT * FROM subscription_plans WHERE developer_id = $1 AND is_active = true ORDER BY created_at DESC",
    )
    .bind(developer_id)
    .fetch_all(pool)
    .await?;

    Ok(plans)
}

/// Get a plan by id, active or not.
pub async fn get_plan(pool: &DbPool, plan_id: Uuid) -> Result<Option<SubscriptionPlan>, AppError> {
    let plan = sqlx::query_as::<_, SubscriptionPlan>("SELECT * FROM subscription_plans WHERE id = $1")
        .bind(plan_id)
        .fetch_optional(pool)
        .await?;

    Ok(plan)
}

/// Get a plan that can currently be paid for.
///
/// # Errors
///
/// - `PlanNotFound`: no such plan, or the plan was deactivated
pub async fn get_active_plan(pool: &DbPool, plan_id: Uuid) -> Result<SubscriptionPlan, AppError> {
    get_plan(pool, plan_id)
        .await?
        .filter(|plan| plan.is_active)
        .ok_or(AppError::PlanNotFound)
}

/// Deactivate a plan (soft delete).
///
/// Usage logs keep referencing the plan; it just stops accepting payments.
///
/// # Errors
///
/// - `PlanNotFound`: plan missing, already inactive, or owned by someone else
pub async fn deactivate_plan(
    pool: &DbPool,
    developer_id: Uuid,
    plan_id: Uuid,
) -> Result<(), AppError> {
    let result = sqlx::query(
        r#"
        UPDATE subscription_plans
        SET is_active = false, updated_at = NOW()
        WHERE id = $1 AND developer_id = $2 AND is_active = true
        "#,
    )
    .bind(plan_id)
    .bind(developer_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::PlanNotFound);
    }

    tracing::info!(%plan_id, %developer_id, "subscription plan deactivated");

    Ok(())
}
