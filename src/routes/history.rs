//! # routes::history
//!
//! `GET /historical?symbol=SPY,QQQ&from=2024-01-01&to=2024-06-30`
//!
//! Response is keyed by symbol; each value is either the bar list or
//! `{ "error": "..." }`, so a mixed batch still answers `200`.

use anyhow::Context;
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    engine::HistoryBatch,
    error::AppError,
    models::{parse_symbol_list, DateRange},
    state::SharedState,
};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub symbol: String,
    /// `YYYY-MM-DD`, inclusive
    pub from:   String,
    /// `YYYY-MM-DD`, exclusive
    pub to:     String,
}

// ─── GET /historical ──────────────────────────────────────────────────────────

pub async fn get_historical(
    State(state): State<SharedState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryBatch>, AppError> {
    // Bad input is rejected before any symbol is fetched.
    let range = DateRange::parse(&query.from, &query.to)?;
    let symbols = parse_symbol_list(&query.symbol)?;
    let coordinator = state.coordinator.clone();

    let batch = tokio::task::spawn_blocking(move || coordinator.history_batch(symbols, range))
        .await
        .context("history batch worker failed")??;

    Ok(Json(batch))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::testing::{app, get};
    use crate::upstream::mock::{bars, date, MockUpstream};

    fn upstream() -> MockUpstream {
        MockUpstream::new().with_history("SPY", vec![Ok(bars(&[date(2024, 1, 2), date(2024, 1, 3)]))])
    }

    #[tokio::test]
    async fn test_mixed_batch_reports_series_and_errors() {
        let (app, _dir) = app(upstream(), None);
        let (status, json) = get(app, "/historical?symbol=spy,nope&from=2024-01-01&to=2024-01-10").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["SPY"].as_array().unwrap().len(), 2);
        assert_eq!(json["SPY"][1]["Date"], "2024-01-03");
        assert!(json["NOPE"]["error"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_date_is_bad_request() {
        let (app, _dir) = app(upstream(), None);
        let (status, json) = get(app, "/historical?symbol=SPY&from=2024/01/01&to=2024-01-10").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn test_all_missing_is_not_found() {
        let (app, _dir) = app(upstream(), None);
        let (status, _) = get(app, "/historical?symbol=NOPE&from=2024-01-01&to=2024-01-10").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
