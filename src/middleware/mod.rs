//! HTTP middleware components.

/// Developer API key authentication
pub mod auth;
