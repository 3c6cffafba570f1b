//! # net — Network Path & HTTP Client Builder
//!
//! Two paths to the upstream:
//! - **Direct**  — ปกติ ใช้ตั้งแต่ start
//! - **Tor**     — SOCKS5h ผ่าน local Tor daemon หลังโดน rate limit ซ้ำหลายครั้ง
//!
//! [`NetworkPathState`] is the only state shared by every symbol task.  It
//! only ever moves from direct to escalated and never back.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use anyhow::{anyhow, Result};
use reqwest::{blocking::Client, Proxy};

/// Fixed local Tor SOCKS endpoint used once the path is escalated.
pub const TOR_PROXY_URL: &str = "socks5h://127.0.0.1:9050";

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

// ─── Path State ───────────────────────────────────────────────────────────────

/// Process-wide, monotonic "escalated" flag. Cheap to clone; all clones share
/// one flag.
#[derive(Clone, Default)]
pub struct NetworkPathState {
    escalated: Arc<AtomicBool>,
}

impl NetworkPathState {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_escalated(&self) -> bool {
        self.escalated.load(Ordering::Acquire)
    }

    /// Switch every later upstream call to the escalated path.
    ///
    /// Idempotent under concurrent callers. Returns `true` only for the one
    /// call that performed the transition.
    pub fn escalate(&self) -> bool {
        self.escalated
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn mode(&self) -> NetMode {
        if self.is_escalated() {
            NetMode::Tor
        } else {
            NetMode::Direct
        }
    }
}

impl fmt::Debug for NetworkPathState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkPathState")
            .field("escalated", &self.is_escalated())
            .finish()
    }
}

// ─── Client Profile ───────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum NetMode {
    #[default]
    Direct,
    Tor,
}

impl fmt::Display for NetMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetMode::Direct => write!(f, "Direct"),
            NetMode::Tor => write!(f, "Tor"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetProfile {
    pub mode:            NetMode,
    pub proxy_url:       Option<String>,
    pub request_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

impl Default for NetProfile {
    fn default() -> Self {
        Self {
            mode:            NetMode::Direct,
            proxy_url:       None,
            request_timeout: Some(Duration::from_secs(30)),
            connect_timeout: Some(Duration::from_secs(10)),
        }
    }
}

impl NetProfile {
    /// Same timeouts, routed through the fixed Tor endpoint.
    pub fn tor(&self) -> Self {
        Self {
            mode:      NetMode::Tor,
            proxy_url: Some(TOR_PROXY_URL.to_string()),
            ..self.clone()
        }
    }
}

/// Build a blocking client for `profile`. Must not be called from inside an
/// async task.
pub fn build_http_client(profile: &NetProfile) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(USER_AGENT)
        .tcp_keepalive(Some(Duration::from_secs(30)));

    if let Some(timeout) = profile.request_timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(timeout) = profile.connect_timeout {
        builder = builder.connect_timeout(timeout);
    }

    match profile.mode {
        NetMode::Direct => {}
        NetMode::Tor => {
            let proxy = profile
                .proxy_url
                .as_ref()
                .ok_or_else(|| anyhow!("proxy_url required for Tor mode"))?;
            builder = builder.proxy(Proxy::all(proxy)?);
        }
    }

    Ok(builder.build()?)
}
