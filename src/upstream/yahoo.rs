//! Yahoo Finance adapter
//!
//! Unauthenticated JSON endpoints:
//! - `v7/finance/options/{symbol}`              → expirations + spot
//! - `v7/finance/options/{symbol}?date={ts}`    → calls/puts for one expiration
//! - `v8/finance/chart/{symbol}?period1&period2` → daily OHLC
//!
//! HTTP 429 (or a "Too Many Requests" body) maps to `RateLimited`; anything
//! else that goes wrong is `Other`.  The active client follows the shared
//! [`NetworkPathState`], so an escalation made by any symbol's retry loop
//! reroutes this adapter's next request.

use std::{thread, time::Duration};

use chrono::{DateTime, NaiveDate, NaiveTime};
use reqwest::{blocking::Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use tracing::debug;

use super::{ChainHead, ExpirationChain, Upstream, UpstreamError, UpstreamResult};
use crate::models::{ContractQuote, DateRange, PriceBar, Symbol};
use crate::net::{build_http_client, NetMode, NetProfile, NetworkPathState};

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo Finance API client
pub struct YahooClient {
    direct:   Client,
    tor:      Client,
    path:     NetworkPathState,
    base_url: String,
    /// Throttle observed before every per-expiration sub-request.
    pause:    Duration,
}

impl YahooClient {
    /// Builds both the direct and the Tor client up front. Call from a
    /// blocking context.
    pub fn new(
        profile: &NetProfile,
        path: NetworkPathState,
        base_url: impl Into<String>,
        pause: Duration,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            direct:   build_http_client(profile)?,
            tor:      build_http_client(&profile.tor())?,
            path,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            pause,
        })
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> UpstreamResult<T> {
        let mode = self.path.mode();
        let client = match mode {
            NetMode::Direct => &self.direct,
            NetMode::Tor => &self.tor,
        };

        debug!(%url, %mode, "GET upstream");

        let response = client
            .get(url)
            .query(query)
            .send()
            .map_err(|e| UpstreamError::other(format!("upstream unreachable ({mode}): {e}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(UpstreamError::RateLimited);
        }

        let body = response
            .text()
            .map_err(|e| UpstreamError::other(format!("failed to read upstream body: {e}")))?;

        if body.contains("Too Many Requests") {
            return Err(UpstreamError::RateLimited);
        }

        if !status.is_success() {
            let snippet: String = body.chars().take(200).collect();
            return Err(UpstreamError::other(format!("upstream HTTP {status}: {snippet}")));
        }

        serde_json::from_str(&body)
            .map_err(|e| UpstreamError::other(format!("failed to parse upstream response: {e}")))
    }
}

impl Upstream for YahooClient {
    fn option_chain(&self, symbol: &Symbol) -> UpstreamResult<ChainHead> {
        let url = format!("{}/v7/finance/options/{}", self.base_url, symbol);
        let response: OptionsResponse = self.get_json(&url, &[])?;
        head_from_response(response)
    }

    fn chain_for_expiration(
        &self,
        symbol: &Symbol,
        expiration: NaiveDate,
    ) -> UpstreamResult<ExpirationChain> {
        thread::sleep(self.pause);

        let url = format!("{}/v7/finance/options/{}", self.base_url, symbol);
        let ts = expiration.and_time(NaiveTime::MIN).and_utc().timestamp();
        let response: OptionsResponse = self.get_json(&url, &[("date", ts.to_string())])?;
        chain_from_response(response)
    }

    fn history(&self, symbol: &Symbol, range: &DateRange) -> UpstreamResult<Vec<PriceBar>> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let period1 = range.start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let period2 = range.end.and_time(NaiveTime::MIN).and_utc().timestamp();
        let query = [
            ("period1", period1.to_string()),
            ("period2", period2.to_string()),
            ("interval", "1d".to_string()),
            ("events", "history".to_string()),
        ];

        let response: ChartResponse = self.get_json(&url, &query)?;
        bars_from_response(response)
    }
}

// ─── Response Conversion ──────────────────────────────────────────────────────

fn first_chain(response: OptionsResponse) -> UpstreamResult<OptionChainData> {
    if let Some(err) = response.option_chain.error {
        return Err(UpstreamError::other(err.describe()));
    }

    response
        .option_chain
        .result
        .into_iter()
        .next()
        .ok_or_else(|| UpstreamError::other("no options data returned, symbol may be delisted"))
}

fn head_from_response(response: OptionsResponse) -> UpstreamResult<ChainHead> {
    let chain = first_chain(response)?;

    let expirations = chain
        .expiration_dates
        .iter()
        .filter_map(|&ts| DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive()))
        .collect();

    Ok(ChainHead {
        expirations,
        spot: chain.quote.and_then(|q| q.regular_market_price),
    })
}

fn chain_from_response(response: OptionsResponse) -> UpstreamResult<ExpirationChain> {
    let chain = first_chain(response)?;

    let Some(options) = chain.options.into_iter().next() else {
        return Ok(ExpirationChain::default());
    };

    let convert = |rows: Vec<OptionRow>| -> Vec<ContractQuote> {
        rows.into_iter()
            .filter_map(|row| {
                Some(ContractQuote {
                    strike:             row.strike?,
                    implied_volatility: row.implied_volatility,
                    last_price:         row.last_price,
                })
            })
            .collect()
    };

    Ok(ExpirationChain {
        calls: convert(options.calls),
        puts:  convert(options.puts),
    })
}

fn bars_from_response(response: ChartResponse) -> UpstreamResult<Vec<PriceBar>> {
    if let Some(err) = response.chart.error {
        return Err(UpstreamError::other(err.describe()));
    }

    let Some(result) = response.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let offset = result.meta.and_then(|m| m.gmtoffset).unwrap_or(0);
    let timestamps = result.timestamp.unwrap_or_default();
    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    // Yahoo pads non-trading slots with nulls; those rows are dropped.
    let bars = timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
            Some(PriceBar {
                date,
                open:  (*quote.open.get(i)?)?,
                high:  (*quote.high.get(i)?)?,
                low:   (*quote.low.get(i)?)?,
                close: (*quote.close.get(i)?)?,
            })
        })
        .collect();

    Ok(bars)
}

// ─── Wire Types ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct YahooErrorBody {
    code:        Option<String>,
    description: Option<String>,
}

impl YahooErrorBody {
    fn describe(&self) -> String {
        match (&self.code, &self.description) {
            (_, Some(desc)) => desc.clone(),
            (Some(code), None) => code.clone(),
            (None, None) => "unknown upstream error".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct OptionsResponse {
    #[serde(rename = "optionChain")]
    option_chain: OptionChainEnvelope,
}

#[derive(Debug, Deserialize)]
struct OptionChainEnvelope {
    #[serde(default)]
    result: Vec<OptionChainData>,
    error:  Option<YahooErrorBody>,
}

#[derive(Debug, Deserialize)]
struct OptionChainData {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,
    quote:            Option<QuoteData>,
    #[serde(default)]
    options:          Vec<OptionsByExpiry>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OptionsByExpiry {
    #[serde(default)]
    calls: Vec<OptionRow>,
    #[serde(default)]
    puts:  Vec<OptionRow>,
}

#[derive(Debug, Deserialize)]
struct OptionRow {
    strike:             Option<f64>,
    #[serde(rename = "lastPrice")]
    last_price:         Option<f64>,
    #[serde(rename = "impliedVolatility")]
    implied_volatility: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error:  Option<YahooErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta:       Option<ChartMeta>,
    timestamp:  Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartMeta {
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open:  Vec<Option<f64>>,
    #[serde(default)]
    high:  Vec<Option<f64>>,
    #[serde(default)]
    low:   Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
}
