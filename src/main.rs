//! # Chainfetch — Option Chain & Price History Fetcher
//!
//! ## Architecture Overview
//!
//! ```text
//!  GET /ticker?symbol=A,B          ┌──────────────────────────────────────────┐
//!  GET /historical?symbol=..&from  │ Coordinator (blocking, spawn_blocking)    │
//!  ───────────────────────────────▶│  ├─ WorkerPool (options: 8, history: 1)  │
//!                                  │  ├─ CacheStore  cache/SYM_DATE_KIND.json  │
//!                                  │  └─ SymbolFetcher                         │
//!                                  │       └─ RetryController ── 3× 429 ──┐    │
//!                                  │            └─ YahooClient ◀──────────┘    │
//!                                  │                 Direct │ Tor (socks5h)    │
//!                                  └──────────────────────────────────────────┘
//! ```
//!
//! ## Environment Variables
//!
//! | Variable           | Default                           | Description                          |
//! |--------------------|-----------------------------------|--------------------------------------|
//! | `BIND_ADDR`        | `0.0.0.0:8000`                    | Address Axum listens on              |
//! | `API_KEY`          | unset                             | Require `X-API-Key` when set         |
//! | `CACHE_DIR`        | `cache`                           | Cache entry directory                |
//! | `CACHE_ENABLED`    | `true`                            | Bypass the cache when `false`        |
//! | `OPTIONS_WORKERS`  | `8`                               | Option batch pool size               |
//! | `HISTORY_WORKERS`  | `1`                               | History batch pool size              |
//! | `RETRY_WAIT_SECS`  | `2`                               | Backoff after a rate-limited attempt |
//! | `MAX_ATTEMPTS`     | `10`                              | Attempt budget per symbol            |
//! | `ESCALATE_AFTER`   | `3`                               | Rate limits before switching to Tor  |
//! | `REQUEST_PAUSE_MS` | `1000`                            | Pause before each expiration request |
//! | `REQUEST_TIMEOUT_SECS` | `30`                          | Upstream HTTP timeout                |
//! | `YAHOO_BASE_URL`   | `https://query1.finance.yahoo.com`| Upstream root                        |
//! | `PREFETCH_SYMBOLS` | empty                             | Symbols warmed into cache at boot    |
//! | `RUST_LOG`         | `chainfetch=debug`                | Tracing filter                       |

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod auth;
mod cache;
mod config;
mod engine;
mod error;
mod models;
mod net;
mod routes;
mod state;
mod upstream;

use config::Config;
use routes::build_router;
use state::{build_state, SharedState};

// ─── Entry Point ──────────────────────────────────────────────────────────────

fn main() -> anyhow::Result<()> {
    // ── 1. Load .env (optional — CI/prod can use real env vars) ──────────────
    dotenvy::dotenv().ok();

    // ── 2. Initialise structured logging ─────────────────────────────────────
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("chainfetch=debug".parse()?)
                .add_directive("tower_http=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    info!(
        r#"

  ╔═══════════════════════════════════════════════╗
  ║        CHAINFETCH — Options & History         ║
  ║   Cache · Retry · Tor Escalation · Fan-Out    ║
  ╚═══════════════════════════════════════════════╝"#
    );

    let config = Config::from_env().context("Failed to load config")?;

    info!(
        bind            = %config.bind_addr,
        cache_dir       = ?config.cache.cache_dir,
        options_workers = config.options_workers,
        history_workers = config.history_workers,
        max_attempts    = config.retry.max_attempts,
        escalate_after  = config.retry.escalate_after,
        "Config loaded"
    );

    // ── 3. Shared state ──────────────────────────────────────────────────────
    //    Blocking HTTP clients are built here, before the runtime exists, and
    //    `state` outlives the runtime so they are never dropped inside it.
    let state = build_state(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build tokio runtime")?;

    runtime.block_on(serve(config, state.clone()))?;
    drop(runtime);

    Ok(())
}

async fn serve(config: Config, state: SharedState) -> anyhow::Result<()> {
    // ── 4. Cache warm-up ─────────────────────────────────────────────────────
    if !config.prefetch_symbols.is_empty() {
        let coordinator = state.coordinator.clone();
        let symbols = config.prefetch_symbols.clone();
        info!(count = symbols.len(), "🔥 Prefetching option chains");

        tokio::spawn(async move {
            let job = tokio::task::spawn_blocking(move || coordinator.prefetch_options(symbols));
            if let Err(e) = job.await {
                error!(error = %e, "Prefetch task crashed");
            }
        });
    }

    // ── 5. Router ────────────────────────────────────────────────────────────
    let app = build_router(state);

    // ── 6. Bind & Serve ──────────────────────────────────────────────────────
    info!(addr = %config.bind_addr, "🚀 Chainfetch server starting");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
