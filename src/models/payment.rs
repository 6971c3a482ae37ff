//! x402 payment models: access checks, payment intents and verification.
//!
//! # Payment Flow
//!
//! 1. Consumer calls `POST /api/payments/check-access` with wallet and plan
//! 2. Server answers with a payment intent (payer, payee, value in wei)
//! 3. Consumer sends the on-chain transaction
//! 4. Consumer calls `POST /api/payments/verify` with the transaction hash
//! 5. Server checks the receipt through the RPC node and records the usage

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::usage::UsageTotals;

/// Request body for `POST /api/payments/check-access`.
#[derive(Debug, Deserialize)]
pub struct CheckAccessRequest {
    #[serde(default)]
    pub customer_wallet: String,
    #[serde(default)]
    pub plan_id: String,
}

/// Why access is not (yet) granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessDenial {
    /// A per-call payment is needed; an intent accompanies the response
    PaymentRequired,
    DailyCapReached,
    MonthlyCapReached,
}

/// Response body for `POST /api/payments/check-access`.
#[derive(Debug, Serialize)]
pub struct CheckAccessResponse {
    pub can_access: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<AccessDenial>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_intent: Option<PaymentIntent>,

    pub usage: UsageTotals,
}

/// Unsigned transaction the consumer is asked to send.
///
/// # Example
///
/// ```json
/// {
///   "from": "0x8ba1f109551bd432803012645ac136ddd64dba72",
///   "to": "0xab5801a7d398351b8be11c439e05c5b3259aec9b",
///   "value": "1000000000000000",
///   "data": {
///     "type": "x402_payment_intent",
///     "callback_url": "http://localhost:3001/payment/callback",
///     "timestamp": 1735689600000,
///     "intent_id": "intent_1735689600000_k3j9x0q2a"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntent {
    pub from: String,
    pub to: String,

    /// Amount in wei as a decimal string
    pub value: String,

    pub data: PaymentIntentData,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentIntentData {
    #[serde(rename = "type")]
    pub intent_type: &'static str,
    pub callback_url: String,

    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    pub intent_id: String,
}

/// Request body for `POST /api/payments/verify`.
#[derive(Debug, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub transaction_hash: String,
    #[serde(default)]
    pub customer_wallet: String,
    #[serde(default)]
    pub plan_id: String,
}

/// Why a transaction did not count as payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationFailure {
    /// No receipt yet: unknown hash or still pending
    TransactionNotFound,
    TransactionReverted,
    PayerMismatch,
    PayeeMismatch,
    InsufficientValue,
}

/// Response body for `POST /api/payments/verify`.
#[derive(Debug, Serialize)]
pub struct VerifyPaymentResponse {
    pub access_granted: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_log_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<VerificationFailure>,
}

impl VerifyPaymentResponse {
    pub fn granted(usage_log_id: Uuid) -> Self {
        Self {
            access_granted: true,
            usage_log_id: Some(usage_log_id),
            reason: None,
        }
    }

    pub fn denied(reason: VerificationFailure) -> Self {
        Self {
            access_granted: false,
            usage_log_id: None,
            reason: Some(reason),
        }
    }
}
