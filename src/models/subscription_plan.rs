//! Subscription plan models.
//!
//! A plan prices each API call in AVAX and may cap how much a single
//! customer spends per day or per month.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a subscription plan record from the database.
///
/// # Amounts
///
/// `price_per_call`, `daily_cap` and `monthly_cap` are AVAX amounts stored as
/// `NUMERIC(38, 18)` and decoded into `Decimal`, never floats.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_per_call: Decimal,
    pub daily_cap: Option<Decimal>,
    pub monthly_cap: Option<Decimal>,

    /// Inactive plans are hidden from listings and refuse payments
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/subscriptions/plans`.
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
/// Amounts may be sent as JSON strings or numbers.
#[derive(Debug, Deserialize)]
pub struct CreatePlanRequest {
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub price_per_call: Option<Decimal>,
    pub daily_cap: Option<Decimal>,
    pub monthly_cap: Option<Decimal>,
}

/// Validated plan fields ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPlan {
    pub name: String,
    pub description: Option<String>,
    pub price_per_call: Decimal,
    pub daily_cap: Option<Decimal>,
    pub monthly_cap: Option<Decimal>,
}

/// Plan as returned to API clients.
///
/// Amounts are normalized (trailing zeros dropped) and serialized as strings.
#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub id: Uuid,
    pub developer_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price_per_call: Decimal,
    pub daily_cap: Option<Decimal>,
    pub monthly_cap: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubscriptionPlan> for PlanResponse {
    fn from(plan: SubscriptionPlan) -> Self {
        Self {
            id: plan.id,
            developer_id: plan.developer_id,
            name: plan.name,
            description: plan.description,
            price_per_call: plan.price_per_call.normalize(),
            daily_cap: plan.daily_cap.map(|d| d.normalize()),
            monthly_cap: plan.monthly_cap.map(|d| d.normalize()),
            is_active: plan.is_active,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}
