//! Developer data models and API request/response types.
//!
//! A developer is an API provider. Registration yields an API key that is
//! shown exactly once; only its SHA-256 digest is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a developer record from the database.
///
/// # Database Table
///
/// Maps to the `developers` table. `wallet_address` is unique and stored
/// lowercase; it receives the payments for this developer's plans.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Developer {
    pub id: Uuid,

    /// SHA-256 hex digest of the developer's API key
    pub api_key_hash: String,

    /// First characters of the plaintext key, for display only
    pub api_key_prefix: String,

    pub wallet_address: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for `POST /api/developers/register`.
///
/// ```json
/// {
///   "wallet_address": "0x8ba1f109551bd432803012645ac136ddd64dba72",
///   "company_name": "Acme Data",
///   "email": "ops@acme.dev"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RegisterDeveloperRequest {
    #[serde(default)]
    pub wallet_address: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
}

/// Returned once, at registration. Carries the plaintext API key.
#[derive(Debug, Serialize)]
pub struct RegisteredDeveloperResponse {
    pub developer_id: Uuid,
    pub api_key: String,
    pub wallet_address: String,
}

/// Response body for `GET /api/developers/profile`.
#[derive(Debug, Serialize)]
pub struct DeveloperProfileResponse {
    pub developer_id: Uuid,
    pub wallet_address: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub api_key_prefix: String,
    pub created_at: DateTime<Utc>,
}

impl From<Developer> for DeveloperProfileResponse {
    fn from(developer: Developer) -> Self {
        Self {
            developer_id: developer.id,
            wallet_address: developer.wallet_address,
            company_name: developer.company_name,
            email: developer.email,
            api_key_prefix: developer.api_key_prefix,
            created_at: developer.created_at,
        }
    }
}
