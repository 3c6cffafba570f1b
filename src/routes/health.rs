//! # routes::health

use axum::{extract::State, response::IntoResponse, Json};
use serde_json::json;

use crate::state::SharedState;

// ─── GET /health ──────────────────────────────────────────────────────────────

pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    Json(json!({
        "ok":             true,
        "escalated":      state.network.is_escalated(),
        "network":        state.network.mode().to_string(),
        "partition_date": state.coordinator.cache().partition_date(),
        "cache_dir":      state.coordinator.cache().cache_dir(),
    }))
}
