//! Shared application state handed to every handler.

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, db::DbPool, services::chain_client::ChainClient};

/// Everything a request may need: the pool, the RPC client and settings.
///
/// Cloned per request by axum; all fields are cheap handles.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub chain: ChainClient,
    pub config: Arc<Config>,
}

impl FromRef<AppState> for DbPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}
