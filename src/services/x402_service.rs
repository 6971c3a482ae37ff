//! x402 service - payment intents and payment verification.
//!
//! # Verification
//!
//! A transaction hash grants one call when:
//! 1. the plan exists and is active
//! 2. the hash has never been redeemed before
//! 3. its receipt reports `status == 1`
//! 4. (strict matching) it was sent by the customer, to the developer, for at
//!    least the plan price
//!
//! The usage log insert is guarded by a unique index on the hash, so two
//! concurrent redemptions of one payment cannot both succeed.

use chrono::Utc;
use rand::Rng;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        payment::{
            AccessDenial, CheckAccessResponse, PaymentIntent, PaymentIntentData,
            VerificationFailure, VerifyPaymentResponse,
        },
        subscription_plan::SubscriptionPlan,
        usage::UsageTotals,
    },
    services::{
        chain_client::{ChainTransaction, ReceiptStatus},
        developer_service, subscription_service, usage_service,
    },
    state::AppState,
};

/// `data.type` of every intent.
pub const INTENT_TYPE: &str = "x402_payment_intent";

/// Endpoint label recorded with verified payments.
pub const PAID_ENDPOINT: &str = "api-call";

const WEI_DECIMALS: u32 = 18;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Decide whether a customer may call the plan's API right now.
///
/// Every call is paid individually, so the answer is always "not yet": either
/// a cap blocks further spending, or a payment intent is returned.
pub async fn check_access(
    state: &AppState,
    customer_wallet: &str,
    plan_id: Uuid,
) -> Result<CheckAccessResponse, AppError> {
    let plan = subscription_service::get_active_plan(&state.pool, plan_id).await?;
    let usage =
        usage_service::usage_totals_for_wallet(&state.pool, customer_wallet, plan_id).await?;

    if let Some(denial) = cap_denial(&plan, &usage) {
        tracing::info!(%plan_id, customer = %customer_wallet, ?denial, "spending cap reached");
        return Ok(CheckAccessResponse {
            can_access: false,
            reason: Some(denial),
            payment_intent: None,
            usage,
        });
    }

    let developer = developer_service::find_by_id(&state.pool, plan.developer_id)
        .await?
        .ok_or(AppError::DeveloperNotFound)?;

    let intent = create_payment_intent(
        customer_wallet,
        &developer.wallet_address,
        plan.price_per_call,
        state.config.payment_callback_url(),
    )?;

    tracing::info!(%plan_id, customer = %customer_wallet, intent_id = %intent.data.intent_id, "payment intent created");

    Ok(CheckAccessResponse {
        can_access: false,
        reason: Some(AccessDenial::PaymentRequired),
        payment_intent: Some(intent),
        usage,
    })
}

/// Which cap, if any, one more paid call would exceed.
pub fn cap_denial(plan: &SubscriptionPlan, usage: &UsageTotals) -> Option<AccessDenial> {
    let exceeds =
        |cap: Option<Decimal>, spent: Decimal| cap.is_some_and(|cap| spent + plan.price_per_call > cap);

    if exceeds(plan.daily_cap, usage.daily_total) {
        Some(AccessDenial::DailyCapReached)
    } else if exceeds(plan.monthly_cap, usage.monthly_total) {
        Some(AccessDenial::MonthlyCapReached)
    } else {
        None
    }
}

/// Build an x402 payment intent for `amount` AVAX.
pub fn create_payment_intent(
    from: &str,
    to: &str,
    amount: Decimal,
    callback_url: String,
) -> Result<PaymentIntent, AppError> {
    let value = avax_to_wei(amount)?;
    let timestamp = Utc::now().timestamp_millis();

    Ok(PaymentIntent {
        from: from.to_string(),
        to: to.to_string(),
        value: value.to_string(),
        data: PaymentIntentData {
            intent_type: INTENT_TYPE,
            callback_url,
            timestamp,
            intent_id: generate_intent_id(timestamp),
        },
    })
}

/// Verify an on-chain payment and, if it checks out, record the paid call.
///
/// # Errors
///
/// - `PlanNotFound`: plan missing or inactive
/// - `Conflict`: the transaction hash was already redeemed
/// - `Rpc`: the blockchain node could not answer
/// - `Database`: database error occurred
pub async fn verify_and_grant_access(
    state: &AppState,
    tx_hash: &str,
    customer_wallet: &str,
    plan_id: Uuid,
) -> Result<VerifyPaymentResponse, AppError> {
    let plan = subscription_service::get_active_plan(&state.pool, plan_id).await?;

    if usage_service::payment_hash_used(&state.pool, tx_hash).await? {
        tracing::warn!(%tx_hash, %plan_id, "payment hash reused");
        return Err(AppError::Conflict(
            "Payment has already been redeemed".to_string(),
        ));
    }

    match state.chain.transaction_receipt(tx_hash).await? {
        ReceiptStatus::Success => {}
        ReceiptStatus::Reverted => {
            tracing::warn!(%tx_hash, "payment transaction reverted");
            return Ok(VerifyPaymentResponse::denied(
                VerificationFailure::TransactionReverted,
            ));
        }
        ReceiptStatus::NotFound => {
            tracing::warn!(%tx_hash, "payment transaction not found");
            return Ok(VerifyPaymentResponse::denied(
                VerificationFailure::TransactionNotFound,
            ));
        }
    }

    if state.config.strict_payment_matching {
        let developer = developer_service::find_by_id(&state.pool, plan.developer_id)
            .await?
            .ok_or(AppError::DeveloperNotFound)?;

        let Some(tx) = state.chain.transaction(tx_hash).await? else {
            return Ok(VerifyPaymentResponse::denied(
                VerificationFailure::TransactionNotFound,
            ));
        };

        let price_wei = avax_to_wei(plan.price_per_call)?;
        if let Err(failure) =
            match_payment(&tx, customer_wallet, &developer.wallet_address, price_wei)
        {
            tracing::warn!(%tx_hash, ?failure, "payment does not match plan");
            return Ok(VerifyPaymentResponse::denied(failure));
        }
    }

    let customer = usage_service::get_or_create_customer(&state.pool, customer_wallet).await?;
    let log = usage_service::log_usage(
        &state.pool,
        customer.id,
        plan.id,
        plan.price_per_call,
        Some(tx_hash),
        Some(PAID_ENDPOINT),
    )
    .await?;

    tracing::info!(%tx_hash, %plan_id, customer_id = %customer.id, usage_log_id = %log.id, "access granted");

    Ok(VerifyPaymentResponse::granted(log.id))
}

/// Check that a transaction pays `price_wei` from `payer` to `payee`.
pub fn match_payment(
    tx: &ChainTransaction,
    payer: &str,
    payee: &str,
    price_wei: u128,
) -> Result<(), VerificationFailure> {
    if !tx.from.eq_ignore_ascii_case(payer) {
        return Err(VerificationFailure::PayerMismatch);
    }
    if !tx
        .to
        .as_deref()
        .is_some_and(|to| to.eq_ignore_ascii_case(payee))
    {
        return Err(VerificationFailure::PayeeMismatch);
    }
    if tx.value_wei < price_wei {
        return Err(VerificationFailure::InsufficientValue);
    }
    Ok(())
}

/// Convert an AVAX amount to wei (18 decimals), exactly.
///
/// # Errors
///
/// `InvalidRequest` when the amount is negative, finer than one wei, or too
/// large to represent.
pub fn avax_to_wei(amount: Decimal) -> Result<u128, AppError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AppError::InvalidRequest(
            "Amount cannot be negative".to_string(),
        ));
    }

    let amount = amount.normalize();
    let scale = amount.scale();
    if scale > WEI_DECIMALS {
        return Err(AppError::InvalidRequest(
            "Amount is more precise than one wei".to_string(),
        ));
    }

    let mantissa = amount.mantissa().unsigned_abs();

    10u128
        .checked_pow(WEI_DECIMALS - scale)
        .and_then(|factor| mantissa.checked_mul(factor))
        .ok_or_else(|| AppError::InvalidRequest("Amount is too large".to_string()))
}

/// `intent_<millis>_<9 lowercase base36 chars>`
fn generate_intent_id(timestamp_millis: i64) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..9)
        .map(|_| BASE36[rng.random_range(0..BASE36.len())] as char)
        .collect();
    format!("intent_{timestamp_millis}_{suffix}")
}
