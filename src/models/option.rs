//! # models::option
//!
//! Defines [`OptionRecord`], the uniform row produced for every call/put
//! contract in a symbol's chain.  Field names on the wire match what the
//! `/ticker` consumers already read (`type`, `impliedVolatility`, ...).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Symbol;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    Call,
    Put,
}

/// One option contract, flattened.  Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionRecord {
    pub symbol: String,

    #[serde(rename = "type")]
    pub contract_type: ContractType,

    pub strike: f64,

    /// Serialized as `YYYY-MM-DD`.
    pub expiration: NaiveDate,

    #[serde(rename = "impliedVolatility")]
    pub implied_volatility: Option<f64>,

    #[serde(rename = "lastPrice")]
    pub last_price: Option<f64>,

    /// Underlying spot price at fetch time, shared by every row of one fetch.
    pub spot: Option<f64>,
}

/// Raw contract row as the upstream returns it inside one expiration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContractQuote {
    pub strike: f64,
    pub implied_volatility: Option<f64>,
    pub last_price: Option<f64>,
}

impl OptionRecord {
    pub fn from_quote(
        symbol: &Symbol,
        contract_type: ContractType,
        expiration: NaiveDate,
        spot: Option<f64>,
        quote: &ContractQuote,
    ) -> Self {
        Self {
            symbol: symbol.as_str().to_string(),
            contract_type,
            strike: quote.strike,
            expiration,
            implied_volatility: quote.implied_volatility,
            last_price: quote.last_price,
            spot,
        }
    }
}
