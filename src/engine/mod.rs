//! Fetch orchestration core: retry/escalation, per-symbol fetch, fan-out
//! and result assembly.

pub mod assemble;
pub mod coordinator;
pub mod fetcher;
pub mod pool;
pub mod retry;

pub use assemble::HistoryBatch;
pub use coordinator::Coordinator;
pub use fetcher::SymbolFetcher;
pub use pool::WorkerPool;
pub use retry::RetryPolicy;

/// Per-symbol result. `Empty` (valid symbol, no data) is not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Success(Vec<T>),
    Empty,
    Failure(String),
}
