//! # config — อ่าน Config จาก Environment Variables

use std::{net::SocketAddr, path::PathBuf, str::FromStr, time::Duration};

use anyhow::Context;

use crate::cache::CacheConfig;
use crate::engine::RetryPolicy;
use crate::models::{parse_symbol_list, Symbol};
use crate::net::NetProfile;
use crate::upstream::yahoo::DEFAULT_BASE_URL;

/// Everything the service needs at boot.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the request layer listens on
    pub bind_addr:        SocketAddr,
    /// `X-API-Key` value; `None` = dev mode, every request allowed
    pub api_key:          Option<String>,
    pub cache:            CacheConfig,
    /// Option batch pool size
    pub options_workers:  usize,
    /// History batch pool size (1 = sequential)
    pub history_workers:  usize,
    pub retry:            RetryPolicy,
    /// Throttle before each per-expiration sub-request
    pub request_pause:    Duration,
    pub net:              NetProfile,
    pub yahoo_base_url:   String,
    /// Symbols warmed into the option cache at startup
    pub prefetch_symbols: Vec<Symbol>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env_or("BIND_ADDR", "0.0.0.0:8000")
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be host:port")?;

        let api_key = std::env::var("API_KEY").ok().filter(|k| !k.is_empty());

        let cache = CacheConfig {
            cache_dir: PathBuf::from(env_or("CACHE_DIR", "cache")),
            enabled:   env_parse("CACHE_ENABLED", true)?,
        };

        let retry = RetryPolicy {
            max_attempts:   env_parse("MAX_ATTEMPTS", 10)?,
            wait:           Duration::from_secs(env_parse("RETRY_WAIT_SECS", 2)?),
            escalate_after: env_parse("ESCALATE_AFTER", 3)?,
        };

        let net = NetProfile {
            request_timeout: Some(Duration::from_secs(env_parse("REQUEST_TIMEOUT_SECS", 30)?)),
            ..NetProfile::default()
        };

        let prefetch_symbols = match std::env::var("PREFETCH_SYMBOLS") {
            Ok(raw) if !raw.trim().is_empty() => {
                parse_symbol_list(&raw).context("PREFETCH_SYMBOLS is not a valid symbol list")?
            }
            _ => Vec::new(),
        };

        Ok(Self {
            bind_addr,
            api_key,
            cache,
            options_workers:  env_parse("OPTIONS_WORKERS", 8)?,
            history_workers:  env_parse("HISTORY_WORKERS", 1)?,
            retry,
            request_pause:    Duration::from_millis(env_parse("REQUEST_PAUSE_MS", 1000)?),
            net,
            yahoo_base_url:   env_or("YAHOO_BASE_URL", DEFAULT_BASE_URL),
            prefetch_symbols,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Unset → `default`; set but unparsable → error naming the variable.
fn env_parse<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}
