//! # routes
//!
//! Thin Axum layer: parse query → run the blocking core on
//! `spawn_blocking` → JSON.

pub mod health;
pub mod history;
pub mod options;

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::require_api_key;
use crate::state::SharedState;

pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Fetch ─────────────────────────────────────────────────────────────
        .route("/ticker",     get(options::get_ticker))
        .route("/historical", get(history::get_historical))
        // ── Ops ───────────────────────────────────────────────────────────────
        .route("/health",     get(health::health_check))
        // ── Middleware ────────────────────────────────────────────────────────
        .layer(axum::middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
