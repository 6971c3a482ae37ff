//! API customer and usage log models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A consumer identified by wallet address.
///
/// Created on first verified payment.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiCustomer {
    pub id: Uuid,
    pub wallet_address: String,
    pub current_balance: Decimal,
    pub total_spent: Decimal,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// One paid API call.
///
/// `payment_intent_hash` holds the verified transaction hash and is unique,
/// so a payment can be redeemed at most once.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UsageLog {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub plan_id: Uuid,
    pub amount: Decimal,
    pub payment_intent_hash: Option<String>,
    pub api_endpoint: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Spend of one customer on one plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UsageTotals {
    /// Since the start of the current UTC day
    pub daily_total: Decimal,

    /// Since the start of the current UTC month
    pub monthly_total: Decimal,
}

impl UsageTotals {
    pub const ZERO: UsageTotals = UsageTotals {
        daily_total: Decimal::ZERO,
        monthly_total: Decimal::ZERO,
    };
}

/// Query string for `GET /api/payments/usage`.
#[derive(Debug, Deserialize)]
pub struct UsageQuery {
    #[serde(default)]
    pub customer_wallet: String,
    #[serde(default)]
    pub plan_id: String,
}

/// Response body for `GET /api/payments/usage`.
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub customer_wallet: String,
    pub plan_id: Uuid,
    pub daily_total: Decimal,
    pub monthly_total: Decimal,
}
