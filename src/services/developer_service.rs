//! Developer service - registration and API key lookup.
//!
//! # API Keys
//!
//! Keys have the form `pn_<64 hex chars>` (32 random bytes). The plaintext key
//! is returned once at registration; the database only keeps its SHA-256 hex
//! digest plus a short display prefix.

use crate::{db::DbPool, error::AppError, models::developer::Developer};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Prefix shared by every issued API key.
pub const API_KEY_PREFIX: &str = "pn_";

/// Number of leading key characters kept for display.
const DISPLAY_PREFIX_LEN: usize = 11;

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct NewDeveloper {
    pub wallet_address: String,
    pub company_name: Option<String>,
    pub email: Option<String>,
}

/// Register a developer and issue an API key.
///
/// # Returns
///
/// The stored developer and the plaintext API key (never persisted).
///
/// # Errors
///
/// - `Conflict`: a developer with this wallet already exists
/// - `Database`: database error occurred
pub async fn register_developer(
    pool: &DbPool,
    new_developer: NewDeveloper,
) -> Result<(Developer, String), AppError> {
    if find_by_wallet(pool, &new_developer.wallet_address)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "A developer with this wallet address is already registered".to_string(),
        ));
    }

    let api_key = generate_api_key();

    let developer = sqlx::query_as::<_, Developer>(
        r#"
        INSERT INTO developers (api_key_hash, api_key_prefix, wallet_address, company_name, email)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(hash_api_key(&api_key))
    .bind(&api_key[..DISPLAY_PREFIX_LEN])
    .bind(&new_developer.wallet_address)
    .bind(new_developer.company_name)
    .bind(new_developer.email)
    .fetch_one(pool)
    .await
    .map_err(|e| match AppError::from(e) {
        // Lost a race with a concurrent registration of the same wallet
        AppError::Conflict(_) => AppError::Conflict(
            "A developer with this wallet address is already registered".to_string(),
        ),
        other => other,
    })?;

    tracing::info!(developer_id = %developer.id, wallet = %developer.wallet_address, "developer registered");

    Ok((developer, api_key))
}

/// Look up a developer by plaintext API key.
pub async fn find_by_api_key(pool: &DbPool, api_key: &str) -> Result<Option<Developer>, AppError> {
    let developer =
        sqlx::query_as::<_, Developer>("SELECT * FROM developers WHERE api_key_hash = $1")
            .bind(hash_api_key(api_key))
            .fetch_optional(pool)
            .await?;

    Ok(developer)
}

/// Look up a developer by id.
pub async fn find_by_id(pool: &DbPool, developer_id: Uuid) -> Result<Option<Developer>, AppError> {
    let developer = sqlx::query_as::<_, Developer>("SELECT * FROM developers WHERE id = $1")
        .bind(developer_id)
        .fetch_optional(pool)
        .await?;

    Ok(developer)
}

/// Look up a developer by (lowercase) wallet address.
pub async fn find_by_wallet(
    pool: &DbPool,
    wallet_address: &str,
) -> Result<Option<Developer>, AppError> {
    let developer =
        sqlx::query_as::<_, Developer>("SELECT * FROM developers WHERE wallet_address = $1")
            .bind(wallet_address)
            .fetch_optional(pool)
            .await?;

    Ok(developer)
}

/// Generate a fresh API key: `pn_` followed by 32 random bytes in hex.
pub fn generate_api_key() -> String {
    let bytes: [u8; 32] = rand::random();
    format!("{API_KEY_PREFIX}{}", hex::encode(bytes))
}

/// SHA-256 hex digest of an API key, as stored in `developers.api_key_hash`.
pub fn hash_api_key(api_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(api_key.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{DEVELOPER_WALLET, seed_developer};

    #[test]
    fn api_keys_have_prefix_and_64_hex_chars() {
        let key = generate_api_key();
        let body = key.strip_prefix(API_KEY_PREFIX).unwrap();
        assert_eq!(body.len(), 64);
        assert!(body.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn api_keys_are_unique() {
        assert_ne!(generate_api_key(), generate_api_key());
    }

    #[test]
    fn hash_is_stable_sha256_hex() {
        // sha256("abc")
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(hash_api_key("pn_x"), hash_api_key("pn_x"));
    }

    #[test]
    fn display_prefix_fits_in_key() {
        let key = generate_api_key();
        assert!(key.len() > DISPLAY_PREFIX_LEN);
        assert!(key[..DISPLAY_PREFIX_LEN].starts_with(API_KEY_PREFIX));
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn stored_key_is_hashed_and_resolves(pool: sqlx::PgPool) {
        let (developer, api_key) = seed_developer(&pool, DEVELOPER_WALLET).await;

        assert_eq!(developer.api_key_hash, hash_api_key(&api_key));
        assert_eq!(developer.api_key_prefix, api_key[..DISPLAY_PREFIX_LEN]);

        let found = find_by_api_key(&pool, &api_key).await.unwrap().unwrap();
        assert_eq!(found.id, developer.id);
        assert!(find_by_api_key(&pool, &generate_api_key()).await.unwrap().is_none());
    }

    #[sqlx::test(migrations = "./migrations")]
    async fn a_wallet_registers_only_once(pool: sqlx::PgPool) {
        seed_developer(&pool, DEVELOPER_WALLET).await;

        let again = register_developer(
            &pool,
            NewDeveloper {
                wallet_address: DEVELOPER_WALLET.to_string(),
                company_name: None,
                email: None,
            },
        )
        .await;

        match again {
            Err(err @ AppError::Conflict(_)) => {
                assert_eq!(
                    err.to_string(),
                    "A developer with this wallet address is already registered"
                );
                assert_eq!(err.status_and_code().0, axum::http::StatusCode::CONFLICT);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
