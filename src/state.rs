//! # state
//!
//! AppState — ของที่ทุก Axum handler ใช้ร่วมกัน
//!
//! The coordinator (pools, cache, upstream adapter) is built once at boot
//! from blocking context and shared behind an `Arc`.

use std::sync::Arc;

use anyhow::Context;

use crate::cache::CacheStore;
use crate::config::Config;
use crate::engine::{Coordinator, SymbolFetcher};
use crate::net::NetworkPathState;
use crate::upstream::{Upstream, YahooClient};

/// Top-level shared state injected into every Axum handler.
pub struct AppState {
    /// Blocking fetch core. Call it through `spawn_blocking` only.
    pub coordinator: Arc<Coordinator>,

    /// Same flag the upstream adapter reads; exposed for `/health`.
    pub network:     NetworkPathState,

    /// `None` = dev mode (no `X-API-Key` check).
    pub api_key:     Option<String>,
}

impl AppState {
    pub fn new(coordinator: Coordinator, api_key: Option<String>) -> Self {
        let network = coordinator.fetcher().path().clone();
        Self {
            coordinator: Arc::new(coordinator),
            network,
            api_key,
        }
    }
}

/// Convenience type alias
pub type SharedState = Arc<AppState>;

/// Wire the Yahoo adapter, cache and pools from `config`.
///
/// Builds blocking HTTP clients, so it must run outside the async runtime.
pub fn build_state(config: &Config) -> anyhow::Result<SharedState> {
    let network = NetworkPathState::new();

    let upstream: Arc<dyn Upstream> = Arc::new(
        YahooClient::new(
            &config.net,
            network.clone(),
            config.yahoo_base_url.clone(),
            config.request_pause,
        )
        .context("Failed to build upstream HTTP clients")?,
    );

    let fetcher = SymbolFetcher::new(upstream, config.retry.clone(), network);
    let cache = CacheStore::new(config.cache.clone());
    let coordinator = Coordinator::new(
        fetcher,
        cache,
        config.options_workers,
        config.history_workers,
    )?;

    Ok(Arc::new(AppState::new(coordinator, config.api_key.clone())))
}
