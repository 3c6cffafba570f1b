//! # routes::options
//!
//! `GET /ticker?symbol=AAPL,MSFT` — option chains for one or more symbols

use anyhow::Context;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    error::AppError,
    models::{parse_symbol_list, OptionRecord},
    state::SharedState,
};

#[derive(Debug, Deserialize)]
pub struct TickerQuery {
    /// Comma-delimited symbol list
    pub symbol: String,
}

// ─── GET /ticker ──────────────────────────────────────────────────────────────

/// Flat list of every contract found. `404` when no symbol had any.
pub async fn get_ticker(
    State(state): State<SharedState>,
    Query(query): Query<TickerQuery>,
) -> Result<Json<Vec<OptionRecord>>, AppError> {
    let symbols = parse_symbol_list(&query.symbol)?;
    let coordinator = state.coordinator.clone();

    let batch = tokio::task::spawn_blocking(move || coordinator.options_batch(symbols))
        .await
        .context("option batch worker failed")??;

    if !batch.errors.is_empty() {
        warn!(errors = ?batch.errors, "Option batch finished with per-symbol errors");
    }
    info!(records = batch.records.len(), "✅ Option batch served");

    Ok(Json(batch.records))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::testing::{app, get};
    use crate::upstream::mock::{chain, date, head, MockUpstream};
    use crate::upstream::UpstreamError;

    fn upstream() -> MockUpstream {
        let d1 = date(2026, 11, 20);
        MockUpstream::new()
            .with_heads("AAPL", vec![Ok(head(&[d1], 230.0))])
            .with_chain("AAPL", d1, Ok(chain(225.0)))
            .with_heads("NOPE", vec![Err(UpstreamError::other("No data found"))])
    }

    #[tokio::test]
    async fn test_ticker_returns_flat_records() {
        let (app, _dir) = app(upstream(), None);
        let (status, json) = get(app, "/ticker?symbol=aapl,nope").await;

        assert_eq!(status, StatusCode::OK);
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["symbol"], "AAPL");
        assert_eq!(rows[0]["spot"], 230.0);
    }

    #[tokio::test]
    async fn test_ticker_not_found() {
        let (app, _dir) = app(upstream(), None);
        let (status, json) = get(app, "/ticker?symbol=NOPE").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["ok"], false);
    }

    #[tokio::test]
    async fn test_ticker_bad_symbol() {
        let (app, _dir) = app(upstream(), None);
        let (status, _) = get(app, "/ticker?symbol=..%2Fetc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_api_key_required_when_configured() {
        let (app, _dir) = app(upstream(), Some("secret"));
        let (status, _) = get(app.clone(), "/ticker?symbol=AAPL").await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = get(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
    }
}
