//! Data models representing database entities and API payloads.

/// API provider accounts
pub mod developer;
/// x402 access checks and payment verification payloads
pub mod payment;
/// Per-call pricing plans
pub mod subscription_plan;
/// Paying customers and their usage logs
pub mod usage;
