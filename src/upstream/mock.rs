//! Scripted in-memory [`Upstream`] for engine and route tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::NaiveDate;

use super::{ChainHead, ExpirationChain, Upstream, UpstreamError, UpstreamResult};
use crate::models::{ContractQuote, DateRange, PriceBar, Symbol};

/// Responses are scripted per symbol. A head script is consumed front to
/// back; its last entry repeats once the queue is down to one.
#[derive(Default)]
pub struct MockUpstream {
    heads:     Mutex<HashMap<String, VecDeque<UpstreamResult<ChainHead>>>>,
    chains:    HashMap<(String, NaiveDate), UpstreamResult<ExpirationChain>>,
    histories: Mutex<HashMap<String, VecDeque<UpstreamResult<Vec<PriceBar>>>>>,
    calls:     AtomicUsize,
}

impl MockUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_heads(self, symbol: &str, script: Vec<UpstreamResult<ChainHead>>) -> Self {
        self.heads
            .lock()
            .unwrap()
            .insert(symbol.to_string(), script.into());
        self
    }

    pub fn with_chain(
        mut self,
        symbol: &str,
        expiration: NaiveDate,
        chain: UpstreamResult<ExpirationChain>,
    ) -> Self {
        self.chains.insert((symbol.to_string(), expiration), chain);
        self
    }

    pub fn with_history(self, symbol: &str, script: Vec<UpstreamResult<Vec<PriceBar>>>) -> Self {
        self.histories
            .lock()
            .unwrap()
            .insert(symbol.to_string(), script.into());
        self
    }

    /// Total calls across every method.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next<T: Clone>(
        scripts: &Mutex<HashMap<String, VecDeque<UpstreamResult<T>>>>,
        symbol: &Symbol,
    ) -> UpstreamResult<T> {
        let mut guard = scripts.lock().unwrap();
        let Some(queue) = guard.get_mut(symbol.as_str()) else {
            return Err(UpstreamError::other(format!("{symbol}: not found")));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(UpstreamError::other("empty script")))
        }
    }
}

impl Upstream for MockUpstream {
    fn option_chain(&self, symbol: &Symbol) -> UpstreamResult<ChainHead> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.heads, symbol)
    }

    fn chain_for_expiration(
        &self,
        symbol: &Symbol,
        expiration: NaiveDate,
    ) -> UpstreamResult<ExpirationChain> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.chains
            .get(&(symbol.as_str().to_string(), expiration))
            .cloned()
            .unwrap_or_else(|| Err(UpstreamError::other(format!("{symbol}: no chain for {expiration}"))))
    }

    fn history(&self, symbol: &Symbol, _range: &DateRange) -> UpstreamResult<Vec<PriceBar>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Self::next(&self.histories, symbol)
    }
}

// ─── Fixtures ─────────────────────────────────────────────────────────────────

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn sym(raw: &str) -> Symbol {
    Symbol::parse(raw).unwrap().unwrap()
}

pub fn head(expirations: &[NaiveDate], spot: f64) -> ChainHead {
    ChainHead {
        expirations: expirations.to_vec(),
        spot:        Some(spot),
    }
}

/// One call and one put at `strike`.
pub fn chain(strike: f64) -> ExpirationChain {
    let quote = ContractQuote {
        strike,
        implied_volatility: Some(0.3),
        last_price:         Some(1.25),
    };
    ExpirationChain {
        calls: vec![quote.clone()],
        puts:  vec![quote],
    }
}

pub fn bars(days: &[NaiveDate]) -> Vec<PriceBar> {
    days.iter()
        .map(|&date| PriceBar {
            date,
            open:  10.0,
            high:  11.0,
            low:   9.5,
            close: 10.5,
        })
        .collect()
}
