//! Plug-n-Pay API - Main Application Entry Point
//!
//! A pay-per-call API marketplace backend. Developers register and publish
//! subscription plans priced in AVAX; consumers pay for each call on-chain and
//! the server verifies the transaction before recording the paid usage.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Blockchain**: EVM JSON-RPC over reqwest (receipt + transaction lookup)
//! - **Authentication**: `X-API-Key` with SHA-256 hashing
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations
//! 3. Build the JSON-RPC client
//! 4. Build HTTP router with routes and middleware
//! 5. Serve until Ctrl-C

mod config;
mod db;
mod error;
mod extract;
mod handlers;
mod middleware;
mod models;
mod services;
mod state;
#[cfg(test)]
mod test_support;
mod validation;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{services::chain_client::ChainClient, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info")
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env()?;
    tracing::info!(environment = %config.app_env, "Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    let tables = db::count_public_tables(&pool).await?;
    tracing::info!(tables, "Database migrations complete");

    let chain = ChainClient::new(
        config.avalanche_rpc_url.clone(),
        Duration::from_secs(config.rpc_timeout_secs),
    )?;
    tracing::info!(rpc_url = %chain.rpc_url(), strict = config.strict_payment_matching, "Chain client ready");

    let addr = format!("0.0.0.0:{}", config.server_port);
    let cors_origin = config.cors_origin.clone();

    let state = AppState {
        pool,
        chain,
        config: Arc::new(config),
    };
    let app = app(state)?;

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, %cors_origin, "Plug-n-Pay API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Build the full router: public routes, developer routes behind the API key
/// middleware, CORS, tracing and the JSON 404 fallback.
fn app(state: AppState) -> anyhow::Result<Router> {
    let developer_routes = Router::new()
        .route(
            "/api/developers/profile",
            get(handlers::developers::profile),
        )
        .route(
            "/api/subscriptions/plans",
            post(handlers::subscriptions::create_plan).get(handlers::subscriptions::list_plans),
        )
        .route(
            "/api/subscriptions/plans/{id}",
            axum::routing::delete(handlers::subscriptions::deactivate_plan),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.pool.clone(),
            middleware::auth::auth_middleware,
        ));

    let cors = cors_layer(&state.config.cors_origin)?;

    let router = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route(
            "/api/developers/register",
            post(handlers::developers::register),
        )
        .route(
            "/api/subscriptions/plans/{id}",
            get(handlers::subscriptions::get_plan),
        )
        .route(
            "/api/payments/check-access",
            post(handlers::payments::check_access),
        )
        .route("/api/payments/verify", post(handlers::payments::verify))
        .route("/api/payments/usage", get(handlers::payments::usage))
        .merge(developer_routes)
        .fallback(handlers::not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    // tower-http panics on credentials with a wildcard origin
    anyhow::ensure!(
        origin.trim() != "*",
        "CORS_ORIGIN must name a single origin when credentials are allowed"
    );

    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("CORS_ORIGIN is not a valid header value: {origin}"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-api-key"),
        ]))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
