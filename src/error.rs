//! # error
//!
//! Centralised application error type.
//!
//! Every handler and every batch operation returns `Result<_, AppError>`.
//! Axum's `IntoResponse` impl converts these into structured JSON error
//! bodies so callers always get a machine-readable response even on failure.
//!
//! Per-symbol upstream failures never become an `AppError` on their own; they
//! are folded into the batch payload (see `engine::assemble`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed caller input (symbol list, date range). No fetch is attempted.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// No symbol in the batch produced any data.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Catch-all for unexpected failures (worker join errors, startup).
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal error: {err}"),
            ),
        };

        let body = Json(json!({
            "ok":    false,
            "error": message,
        }));

        (status, body).into_response()
    }
}
