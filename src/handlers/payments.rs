//! x402 payment HTTP handlers.
//!
//! - POST /api/payments/check-access - Ask for access, receive a payment intent
//! - POST /api/payments/verify - Redeem a paid transaction hash
//! - GET /api/payments/usage - Spend of a wallet on a plan

use crate::{
    error::AppError,
    extract::{JsonBody, QueryParams},
    handlers::ApiResponse,
    models::{
        payment::{CheckAccessRequest, CheckAccessResponse, VerifyPaymentRequest, VerifyPaymentResponse},
        usage::{UsageQuery, UsageResponse},
    },
    services::{usage_service, x402_service},
    state::AppState,
    validation::{normalize_transaction_hash, normalize_wallet_address, parse_plan_id},
};
use axum::{Json, extract::State};

/// Check whether a wallet may call a plan's API.
///
/// # Request Body
///
/// ```json
/// {
///   "customer_wallet": "0x8ba1f109551bd432803012645ac136ddd64dba72",
///   "plan_id": "550e8400-e29b-41d4-a716-446655440000"
/// }
/// ```
///
/// # Response (200)
///
/// ```json
/// {
///   "success": true,
///   "data": {
///     "can_access": false,
///     "reason": "payment_required",
///     "payment_intent": { "from": "0x8ba1...", "to": "0xab58...", "value": "1000000000000000", "data": { ... } },
///     "usage": { "daily_total": "0", "monthly_total": "0" }
///   }
/// }
/// ```
///
/// - **Error (400)**: malformed body, missing/malformed wallet or plan id
/// - **Error (404)**: plan unknown or inactive
pub async fn check_access(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CheckAccessRequest>,
) -> Result<Json<ApiResponse<CheckAccessResponse>>, AppError> {
    let customer_wallet = normalize_wallet_address("customer_wallet", &request.customer_wallet)?;
    let plan_id = parse_plan_id(&request.plan_id)?;

    let result = x402_service::check_access(&state, &customer_wallet, plan_id).await?;

    Ok(ApiResponse::ok(result))
}

/// Verify a payment transaction and grant one API call.
///
/// # Request Body
///
/// ```json
/// {
///   "transaction_hash": "0x5c504ed432cb51138bcf09aa5e8a410dd4a1e204ef84bfed1be16dfba1b22060",
///   "customer_wallet": "0x8ba1f109551bd432803012645ac136ddd64dba72",
///   "plan_id": "550e8400-e29b-41d4-a716-446655440000"
/// }
/// ```
///
/// # Response (200)
///
/// `{ "success": true, "data": { "access_granted": true, "usage_log_id": "..." } }`
/// or, when the chain does not show a valid payment,
/// `{ "success": true, "data": { "access_granted": false, "reason": "transaction_reverted" } }`.
///
/// - **Error (400)**: missing/malformed fields
/// - **Error (404)**: plan unknown or inactive
/// - **Error (409)**: transaction hash already redeemed
/// - **Error (502)**: blockchain node unavailable
pub async fn verify(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<VerifyPaymentRequest>,
) -> Result<Json<ApiResponse<VerifyPaymentResponse>>, AppError> {
    let tx_hash = normalize_transaction_hash(&request.transaction_hash)?;
    let customer_wallet = normalize_wallet_address("customer_wallet", &request.customer_wallet)?;
    let plan_id = parse_plan_id(&request.plan_id)?;

    let result =
        x402_service::verify_and_grant_access(&state, &tx_hash, &customer_wallet, plan_id).await?;

    Ok(ApiResponse::ok(result))
}

/// Daily and monthly spend of a wallet on a plan.
///
/// `GET /api/payments/usage?customer_wallet=0x...&plan_id=...`
///
/// Wallets that never paid report zero totals.
pub async fn usage(
    State(state): State<AppState>,
    QueryParams(query): QueryParams<UsageQuery>,
) -> Result<Json<ApiResponse<UsageResponse>>, AppError> {
    let customer_wallet = normalize_wallet_address("customer_wallet", &query.customer_wallet)?;
    let plan_id = parse_plan_id(&query.plan_id)?;

    let totals =
        usage_service::usage_totals_for_wallet(&state.pool, &customer_wallet, plan_id).await?;

    Ok(ApiResponse::ok(UsageResponse {
        customer_wallet,
        plan_id,
        daily_total: totals.daily_total,
        monthly_total: totals.monthly_total,
    }))
}
