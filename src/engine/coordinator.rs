//! # engine::coordinator
//!
//! **Fan-Out Coordinator** — one task per symbol on a bounded pool.
//!
//! ```text
//!  symbols ──▶ WorkerPool ──┬─▶ [AAPL] cache? ─hit──▶ Success(cached)
//!                           │            └─miss─▶ SymbolFetcher ─▶ store ─▶ outcome
//!                           ├─▶ [MSFT] ...
//!                           └─▶ [TSLA] ...
//!                                        │ (completion order)
//!                                        ▼
//!                                  assemble_*  ──▶ payload | NotFound
//! ```
//!
//! No single-flight: two tasks for the same uncached symbol both fetch and
//! both write.

use tracing::{error, info};

use super::assemble::{assemble_history, assemble_options, HistoryBatch, OptionsBatch};
use super::{FetchOutcome, SymbolFetcher, WorkerPool};
use crate::cache::CacheStore;
use crate::error::AppError;
use crate::models::{DataKind, DateRange, OptionRecord, PriceBar, Symbol};

pub struct Coordinator {
    fetcher:      SymbolFetcher,
    cache:        CacheStore,
    options_pool: WorkerPool,
    history_pool: WorkerPool,
}

/// Counts logged after a prefetch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    pub success: usize,
    pub empty:   usize,
    pub failed:  usize,
}

impl Coordinator {
    pub fn new(
        fetcher: SymbolFetcher,
        cache: CacheStore,
        options_workers: usize,
        history_workers: usize,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            fetcher,
            cache,
            options_pool: WorkerPool::new("options", options_workers)?,
            history_pool: WorkerPool::new("history", history_workers)?,
        })
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub fn fetcher(&self) -> &SymbolFetcher {
        &self.fetcher
    }

    // ── Options ───────────────────────────────────────────────────────────────

    /// Blocks until every symbol's task is done.
    pub fn options_batch(&self, symbols: Vec<Symbol>) -> Result<OptionsBatch, AppError> {
        info!(count = symbols.len(), workers = self.options_pool.workers(), "📊 Option batch started");
        let results = self.run_options(symbols);
        assemble_options(results)
    }

    /// Warm the option cache for `symbols`; nothing is returned to a caller.
    pub fn prefetch_options(&self, symbols: Vec<Symbol>) -> PrefetchSummary {
        let mut summary = PrefetchSummary::default();
        for (_, outcome) in self.run_options(symbols) {
            match outcome {
                FetchOutcome::Success(_) => summary.success += 1,
                FetchOutcome::Empty => summary.empty += 1,
                FetchOutcome::Failure(_) => summary.failed += 1,
            }
        }
        info!(?summary, "Prefetch finished");
        summary
    }

    fn run_options(&self, symbols: Vec<Symbol>) -> Vec<(Symbol, FetchOutcome<OptionRecord>)> {
        self.options_pool
            .run(symbols, |symbol| self.options_for(symbol))
            .into_iter()
            .map(|(symbol, result)| {
                let outcome = flatten_panic(&symbol, result);
                (symbol, outcome)
            })
            .collect()
    }

    fn options_for(&self, symbol: &Symbol) -> FetchOutcome<OptionRecord> {
        let kind = DataKind::Options;
        if let Some(records) = self.cache.lookup::<OptionRecord>(symbol, &kind) {
            return FetchOutcome::Success(records);
        }

        info!(%symbol, "No cache. Loading...");
        let outcome = self.fetcher.fetch_options(symbol);
        if let FetchOutcome::Success(records) = &outcome {
            self.cache.store(symbol, &kind, records);
        }
        outcome
    }

    // ── History ───────────────────────────────────────────────────────────────

    pub fn history_batch(
        &self,
        symbols: Vec<Symbol>,
        range: DateRange,
    ) -> Result<HistoryBatch, AppError> {
        info!(
            count = symbols.len(),
            workers = self.history_pool.workers(),
            start = %range.start,
            end = %range.end,
            "📈 History batch started"
        );

        let results = self
            .history_pool
            .run(symbols, |symbol| self.history_for(symbol, &range))
            .into_iter()
            .map(|(symbol, result)| {
                let outcome = flatten_panic(&symbol, result);
                (symbol, outcome)
            })
            .collect();

        assemble_history(results)
    }

    fn history_for(&self, symbol: &Symbol, range: &DateRange) -> FetchOutcome<PriceBar> {
        let kind = DataKind::History(*range);
        if let Some(bars) = self.cache.lookup::<PriceBar>(symbol, &kind) {
            return FetchOutcome::Success(bars);
        }

        let outcome = self.fetcher.fetch_history(symbol, range);
        if let FetchOutcome::Success(bars) = &outcome {
            self.cache.store(symbol, &kind, bars);
        }
        outcome
    }
}

fn flatten_panic<T>(symbol: &Symbol, result: Result<FetchOutcome<T>, String>) -> FetchOutcome<T> {
    result.unwrap_or_else(|reason| {
        error!(%symbol, error = %reason, "Symbol task crashed");
        FetchOutcome::Failure(reason)
    })
}
