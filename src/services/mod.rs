//! Business logic services.
//!
//! Services hold the queries and rules behind each endpoint so handlers stay
//! focused on extraction, validation and response shaping.

pub mod chain_client;
pub mod developer_service;
pub mod subscription_service;
pub mod usage_service;
pub mod x402_service;
