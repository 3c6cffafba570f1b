//! Domain models shared across the fetch pipeline.

pub mod bar;
pub mod option;
pub mod symbol;

pub use bar::{DateRange, PriceBar};
pub use option::{ContractQuote, ContractType, OptionRecord};
pub use symbol::{parse_symbol_list, Symbol};

/// Which cache partition a record sequence belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Options,
    /// History entries are keyed by their range too, so two requests for
    /// different windows never read each other's series.
    History(DateRange),
}

impl DataKind {
    /// Stable tag used in cache file names.
    pub fn tag(&self) -> String {
        match self {
            DataKind::Options => "options".to_string(),
            DataKind::History(range) => format!("history_{}_{}", range.start, range.end),
        }
    }
}
