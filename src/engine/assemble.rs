//! # engine::assemble
//!
//! **Result Assembler** — รวมผลของแต่ละ symbol เป็น payload เดียว
//!
//! Input arrives in completion order.  A batch is `NotFound` only when no
//! symbol produced a non-empty series.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use super::FetchOutcome;
use crate::error::AppError;
use crate::models::{OptionRecord, PriceBar, Symbol};

const NO_HISTORY: &str = "No historical data available";

// ─── Options ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize)]
pub struct OptionsBatch {
    /// Every contract of every successful symbol.
    pub records: Vec<OptionRecord>,
    /// Symbol → failure reason.
    pub errors:  BTreeMap<String, String>,
    /// Symbols that answered with no contracts.
    pub empty:   Vec<String>,
}

pub fn assemble_options(
    results: Vec<(Symbol, FetchOutcome<OptionRecord>)>,
) -> Result<OptionsBatch, AppError> {
    let mut batch = OptionsBatch::default();

    for (symbol, outcome) in results {
        match outcome {
            FetchOutcome::Success(records) => batch.records.extend(records),
            FetchOutcome::Empty => batch.empty.push(symbol.to_string()),
            FetchOutcome::Failure(reason) => {
                warn!(%symbol, error = %reason, "Symbol failed");
                batch.errors.insert(symbol.to_string(), reason);
            }
        }
    }

    if batch.records.is_empty() {
        return Err(AppError::NotFound("No option found for symbols".into()));
    }

    Ok(batch)
}

// ─── History ──────────────────────────────────────────────────────────────────

/// Either a symbol's bars or why it has none.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeriesOrError {
    Series(Vec<PriceBar>),
    Error { error: String },
}

/// Symbol → series-or-error, serialized as a plain JSON object.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct HistoryBatch(pub BTreeMap<String, SeriesOrError>);

pub fn assemble_history(
    results: Vec<(Symbol, FetchOutcome<PriceBar>)>,
) -> Result<HistoryBatch, AppError> {
    let mut map = BTreeMap::new();

    for (symbol, outcome) in results {
        let entry = match outcome {
            FetchOutcome::Success(bars) => SeriesOrError::Series(bars),
            FetchOutcome::Empty => SeriesOrError::Error { error: NO_HISTORY.to_string() },
            FetchOutcome::Failure(reason) => {
                warn!(%symbol, error = %reason, "Symbol failed");
                SeriesOrError::Error { error: reason }
            }
        };
        map.insert(symbol.to_string(), entry);
    }

    let any_series = map.values().any(|v| matches!(v, SeriesOrError::Series(_)));
    if !any_series {
        let reasons: Vec<String> = map
            .iter()
            .map(|(symbol, v)| match v {
                SeriesOrError::Error { error } => format!("{symbol}: {error}"),
                SeriesOrError::Series(_) => symbol.clone(),
            })
            .collect();
        return Err(AppError::NotFound(format!(
            "No historical data for symbols ({})",
            reasons.join("; ")
        )));
    }

    Ok(HistoryBatch(map))
}
