// SPDX-License-Identifier: EUPL-1.2
// Copyright (c) 2026 Benjamin Küttner <benjamin.kuettner@icloud.com>

//! Axum-based HTTP gateway.
//!
//! - Request body size limits (2 MiB — base64 image payloads must fit)
//! - Request timeouts (30s) to prevent slow-loris attacks
//! - CORS restricted to the configured frontend origin
//! - Every handler is stateless; the only process-wide state is the
//!   immutable configuration and the shared provider clients

pub mod api;

use crate::config::Config;
use crate::providers::{
    create_description_generator, create_identity_oracle, DescriptionGenerator, IdentityOracle,
};
use crate::store::{FirestoreStore, ProductStore};
use anyhow::Result;
use axum::{
    extract::State,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MiB) — fits a base64 product photo
/// while still preventing memory exhaustion.
pub const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;
/// Request timeout (30s) — prevents slow-loris attacks.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for all axum handlers. Providers are injected here
/// explicitly — no ambient globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub oracle: Arc<dyn IdentityOracle>,
    pub store: Arc<dyn ProductStore>,
    /// Absent when no AI key is configured; the generation endpoint
    /// then reports the misconfiguration instead of bypassing it.
    pub generator: Option<Arc<dyn DescriptionGenerator>>,
}

/// Build the full application router. Separated from [`run_gateway`] so
/// integration tests drive the exact router the binary serves.
pub fn build_router(state: AppState) -> Router {
    let cors = match state.config.allow_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new().allow_origin(AllowOrigin::exact(origin)),
        Err(_) => {
            tracing::warn!(
                "invalid allow_origin {:?}, falling back to any origin",
                state.config.allow_origin
            );
            CorsLayer::new().allow_origin(tower_http::cors::Any)
        }
    }
    .allow_methods(tower_http::cors::Any)
    .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(handle_health))
        .merge(api::routes())
        .with_state(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Run the HTTP gateway.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let display_addr = format!("{host}:{}", listener.local_addr()?.port());

    if config.api_secret.is_none() {
        tracing::warn!("API secret not configured — product endpoints will answer 500");
    }
    if config.master_secret.is_none() {
        tracing::warn!("master secret not configured — role endpoints will answer 500");
    }

    let oracle = create_identity_oracle(&config);
    let generator = create_description_generator(&config);
    let store: Arc<dyn ProductStore> = Arc::new(FirestoreStore::new(
        &config.identity_project,
        &config.identity_api_key,
    ));

    let state = AppState {
        config: Arc::new(config),
        oracle,
        store,
        generator,
    };

    println!("🛍️  Listly Gateway listening on http://{display_addr}");
    println!("  POST /auth/register        — create an account");
    println!("  GET  /auth/me              — identity behind a bearer token");
    println!("  POST /products/            — create a listing (API key + token)");
    println!("  GET  /products/my-products — your listings");
    println!("  GET  /admin/products       — review queue (admin)");
    println!("  GET  /health               — health check");
    println!("  Press Ctrl+C to stop.\n");

    let app = build_router(state);
    axum::serve(listener, app).await?;

    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// AXUM HANDLERS
// ══════════════════════════════════════════════════════════════════════════════

/// GET / — service banner (no secrets leaked)
async fn handle_root(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "message": "Listly API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "storage_bucket": state.config.storage_bucket,
    });
    Json(body)
}

/// GET /health — always public
async fn handle_health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}
