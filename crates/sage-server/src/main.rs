//! PortfolioSage HTTP Server
//!
//! Axum server in front of the portfolio advisor: login gate, analysis
//! submission, cached result lookup and the legacy `?result=` decoder.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use portfolio_advisor::{CacheConfig, PortfolioAdapter, ResultCache};
use sage_auth::{AuthConfig, SessionManager};
use sage_runtime::{build_provider, RuntimeConfig};

use crate::handlers::{
    decode_analysis, get_analysis, health_check, login, logout, submit_analysis,
};
use crate::state::AppState;

/// Build the router over a prepared state
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        // Session gate
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        // Analysis
        .route("/api/analysis", post(submit_analysis).get(decode_analysis))
        .route("/api/analysis/{id}", get(get_analysis))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Before the subscriber, so RUST_LOG may come from .env
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // LLM provider
    let runtime = RuntimeConfig::from_env()?;
    let provider = build_provider(&runtime)?;

    match provider.health_check().await {
        Ok(true) => tracing::info!("✓ Connected to {} (model {})", provider.name(), runtime.model),
        Ok(false) | Err(_) => {
            tracing::warn!("⚠ {} not reachable - analyses will fail until it is", provider.name());
        }
    }

    let adapter = PortfolioAdapter::new(Arc::clone(&provider), runtime.generation_options());

    // Session gate
    let auth = AuthConfig::from_env()?;
    if auth.credentials.is_empty() {
        tracing::warn!("⚠ SAGE_CREDENTIALS is empty - nobody can log in");
    }
    let sessions = SessionManager::from_config(auth);

    let cache = CacheConfig::from_env();
    tracing::info!(ttl_secs = cache.ttl.num_seconds(), capacity = cache.capacity, "Result cache configured");

    let state = AppState::new(provider, adapter, sessions, ResultCache::new(cache));

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("🚀 PortfolioSage running on http://{}", addr);
    tracing::info!("══════════════════════════════════════════════════");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health              - Health check");
    tracing::info!("  POST /api/login           - Open a session");
    tracing::info!("  POST /api/logout          - Close the session");
    tracing::info!("  POST /api/analysis        - Analyze a portfolio");
    tracing::info!("  GET  /api/analysis/{{id}}   - Fetch a cached analysis");
    tracing::info!("  GET  /api/analysis?result - Decode a transported analysis");

    axum::serve(listener, app(state)).await?;

    Ok(())
}
