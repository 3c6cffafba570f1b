//! # upstream — Quote Provider Boundary
//!
//! [`Upstream`] is the capability boundary around the external data source.
//! Every call returns a tagged result: data, [`UpstreamError::RateLimited`]
//! or [`UpstreamError::Other`].  Implementations never retry; retry policy
//! lives in `engine::retry`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{ContractQuote, DateRange, PriceBar, Symbol};

#[cfg(test)]
pub mod mock;
pub mod yahoo;

pub use yahoo::YahooClient;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    /// Upstream is throttling us. Transient, worth waiting out.
    #[error("rate limited by upstream")]
    RateLimited,

    /// Network, parse or not-found failure. Retrying does not help.
    #[error("{0}")]
    Other(String),
}

impl UpstreamError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Expiration list plus spot price, the first step of a chain retrieval.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChainHead {
    pub expirations: Vec<NaiveDate>,
    pub spot:        Option<f64>,
}

/// Calls and puts for one expiration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpirationChain {
    pub calls: Vec<ContractQuote>,
    pub puts:  Vec<ContractQuote>,
}

/// Blocking provider interface. Called from worker-pool threads only.
pub trait Upstream: Send + Sync {
    fn option_chain(&self, symbol: &Symbol) -> UpstreamResult<ChainHead>;

    fn chain_for_expiration(
        &self,
        symbol: &Symbol,
        expiration: NaiveDate,
    ) -> UpstreamResult<ExpirationChain>;

    fn history(&self, symbol: &Symbol, range: &DateRange) -> UpstreamResult<Vec<PriceBar>>;
}
