//! # models::bar
//!
//! Daily OHLC bar and the inclusive/exclusive date window used to request it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// One trading day. Serialized with the `Date/Open/High/Low/Close` keys the
/// `/historical` consumers expect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PriceBar {
    pub date:  NaiveDate,
    pub open:  f64,
    pub high:  f64,
    pub low:   f64,
    pub close: f64,
}

/// Requested history window: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end:   NaiveDate,
}

impl DateRange {
    /// Parse `YYYY-MM-DD` bounds. A reversed range is rejected as well.
    pub fn parse(from: &str, to: &str) -> Result<Self, AppError> {
        let parse = |s: &str| {
            NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
                AppError::BadRequest("Invalid date format. Use YYYY-MM-DD.".into())
            })
        };

        let start = parse(from)?;
        let end = parse(to)?;

        if start > end {
            return Err(AppError::BadRequest(format!(
                "Invalid date range: from {start} is after to {end}"
            )));
        }

        Ok(Self { start, end })
    }
}
