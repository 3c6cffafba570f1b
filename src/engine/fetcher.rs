//! # engine::fetcher
//!
//! Single-symbol retrieval: retry loop around the first upstream call, then
//! the per-expiration walk for option chains.
//!
//! Only the head call (expirations + spot) and the history call go through
//! the retry controller.  A failing expiration is logged and skipped; the
//! rest of the chain is still returned.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::retry::{RetryController, RetryPolicy};
use super::FetchOutcome;
use crate::models::{ContractType, DateRange, OptionRecord, PriceBar, Symbol};
use crate::net::NetworkPathState;
use crate::upstream::Upstream;

pub struct SymbolFetcher {
    upstream: Arc<dyn Upstream>,
    policy:   RetryPolicy,
    path:     NetworkPathState,
}

impl SymbolFetcher {
    pub fn new(upstream: Arc<dyn Upstream>, policy: RetryPolicy, path: NetworkPathState) -> Self {
        Self { upstream, policy, path }
    }

    pub fn path(&self) -> &NetworkPathState {
        &self.path
    }

    /// Every call and put across every listed expiration.
    pub fn fetch_options(&self, symbol: &Symbol) -> FetchOutcome<OptionRecord> {
        info!(%symbol, "🔎 Fetching option chain");

        let controller = RetryController::new(&self.policy, &self.path);
        let outcome = controller.run(symbol, || self.upstream.option_chain(symbol));
        debug!(
            %symbol,
            state = ?outcome.state,
            attempts = outcome.attempts,
            escalations = outcome.escalations,
            "Chain head retry loop finished"
        );

        let head_attempts = outcome.attempts;
        let head = match outcome.result {
            Ok(head) => head,
            Err(reason) => return FetchOutcome::Failure(reason.to_string()),
        };

        info!(%symbol, terms = head.expirations.len(), spot = ?head.spot, "Terms found");

        let mut records = Vec::new();
        for &expiration in &head.expirations {
            let chain = match self.upstream.chain_for_expiration(symbol, expiration) {
                Ok(chain) => chain,
                Err(e) => {
                    warn!(%symbol, %expiration, head_attempts, error = %e, "Expiration skipped");
                    continue;
                }
            };

            for (rows, contract_type) in [(&chain.calls, ContractType::Call), (&chain.puts, ContractType::Put)] {
                records.extend(rows.iter().map(|quote| {
                    OptionRecord::from_quote(symbol, contract_type, expiration, head.spot, quote)
                }));
            }
        }

        if records.is_empty() {
            info!(%symbol, "No option found");
            FetchOutcome::Empty
        } else {
            FetchOutcome::Success(records)
        }
    }

    /// Daily bars for `range`.
    pub fn fetch_history(&self, symbol: &Symbol, range: &DateRange) -> FetchOutcome<PriceBar> {
        info!(%symbol, start = %range.start, end = %range.end, "🔎 Fetching history");

        let controller = RetryController::new(&self.policy, &self.path);
        let outcome = controller.run(symbol, || self.upstream.history(symbol, range));
        debug!(
            %symbol,
            state = ?outcome.state,
            attempts = outcome.attempts,
            escalations = outcome.escalations,
            "History retry loop finished"
        );

        match outcome.result {
            Ok(bars) if bars.is_empty() => FetchOutcome::Empty,
            Ok(bars) => FetchOutcome::Success(bars),
            Err(reason) => FetchOutcome::Failure(reason.to_string()),
        }
    }
}
