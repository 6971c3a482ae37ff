//! Application configuration management.
//!
//! Configuration is read from environment variables (optionally seeded from a
//! `.env` file) and deserialized with `envy` into a type-safe struct.

use serde::Deserialize;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 3001
/// - `AVALANCHE_RPC_URL` (optional): EVM JSON-RPC endpoint used to verify payments
/// - `WEBHOOK_BASE_URL` (optional): base URL placed in payment intent callbacks
/// - `CORS_ORIGIN` (optional): origin allowed to call the API from a browser
/// - `RPC_TIMEOUT_SECS` (optional): per-call timeout for the RPC node
/// - `STRICT_PAYMENT_MATCHING` (optional): check payer, payee and value of paid transactions
/// - `APP_ENV` (optional): deployment label reported by `/health`
/// - `DB_MAX_CONNECTIONS` (optional): connection pool size
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_rpc_url")]
    pub avalanche_rpc_url: String,

    #[serde(default = "default_webhook_base_url")]
    pub webhook_base_url: String,

    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    #[serde(default = "default_rpc_timeout_secs")]
    pub rpc_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub strict_payment_matching: bool,

    #[serde(default = "default_app_env")]
    pub app_env: String,

    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,
}

fn default_port() -> u16 {
    3001
}

fn default_rpc_url() -> String {
    "https://api.avax-test.network/ext/bc/C/rpc".to_string()
}

fn default_webhook_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_rpc_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_db_max_connections() -> u32 {
    5
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },

    /// Credentialed CORS cannot be combined with a wildcard origin.
    #[error("CORS_ORIGIN must name a single origin, not \"*\"")]
    WildcardCorsOrigin,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Loads `.env` first if present, then deserializes the process
    /// environment and validates URL-valued settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Values cannot be parsed into expected types
    /// - A URL setting is malformed
    /// - `CORS_ORIGIN` is the `*` wildcard
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        let config = envy::from_env::<Config>()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("AVALANCHE_RPC_URL", &self.avalanche_rpc_url),
            ("WEBHOOK_BASE_URL", &self.webhook_base_url),
        ] {
            url::Url::parse(value).map_err(|source| ConfigError::InvalidUrl { name, source })?;
        }

        if self.cors_origin.trim() == "*" {
            return Err(ConfigError::WildcardCorsOrigin);
        }
        Ok(())
    }

    /// Callback URL embedded in every payment intent.
    pub fn payment_callback_url(&self) -> String {
        format!(
            "{}/payment/callback",
            self.webhook_base_url.trim_end_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, envy::Error> {
        envy::from_iter(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        )
    }

    #[test]
    fn defaults_apply_when_only_database_url_is_set() {
        let config = from_pairs(&[("DATABASE_URL", "postgres://localhost/plug_n_pay")]).unwrap();

        assert_eq!(config.server_port, 3001);
        assert_eq!(
            config.avalanche_rpc_url,
            "https://api.avax-test.network/ext/bc/C/rpc"
        );
        assert_eq!(config.cors_origin, "http://localhost:3000");
        assert_eq!(config.rpc_timeout_secs, 10);
        assert!(config.strict_payment_matching);
        assert_eq!(config.db_max_connections, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_database_url_is_an_error() {
        assert!(from_pairs(&[("SERVER_PORT", "8080")]).is_err());
    }

    #[test]
    fn malformed_rpc_url_is_rejected() {
        let config = from_pairs(&[
            ("DATABASE_URL", "postgres://localhost/plug_n_pay"),
            ("AVALANCHE_RPC_URL", "not a url"),
        ])
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl {
                name: "AVALANCHE_RPC_URL",
                ..
            })
        ));
    }

    #[test]
    fn wildcard_cors_origin_is_rejected() {
        let config = from_pairs(&[
            ("DATABASE_URL", "postgres://localhost/plug_n_pay"),
            ("CORS_ORIGIN", "*"),
        ])
        .unwrap();

        assert!(matches!(
            config.validate(),
            Err(ConfigError::WildcardCorsOrigin)
        ));
    }

    #[test]
    fn callback_url_strips_trailing_slash() {
        let config = from_pairs(&[
            ("DATABASE_URL", "postgres://localhost/plug_n_pay"),
            ("WEBHOOK_BASE_URL", "https://pay.example.com/"),
        ])
        .unwrap();

        assert_eq!(
            config.payment_callback_url(),
            "https://pay.example.com/payment/callback"
        );
    }
}
