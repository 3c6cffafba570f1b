//! # engine::retry
//!
//! **Retry / Escalation Controller** — วน attempt ต่อ symbol จนกว่าจะได้ข้อมูลหรือยอมแพ้
//!
//! ```text
//!            ┌──────────── RateLimited (n+1 < escalate_after) ───────────┐
//!            ▼                                                          │
//!   Attempting(n) ── Ok ──▶ Succeeded                                   │
//!       │    │                                                          │
//!       │    └── Other ──▶ GaveUp                                        │
//!       │                                                               │
//!       └── RateLimited (n+1 == escalate_after) ──▶ Escalated ──▶ Attempting(n+1)
//!
//!   Attempting(max_attempts) ──▶ GaveUp
//! ```
//!
//! Every rate-limited attempt sleeps `wait` before the next one.  Escalation
//! flips the shared [`NetworkPathState`]; it is never undone.

use std::{thread, time::Duration};

use tracing::{error, info, warn};

use crate::models::Symbol;
use crate::net::NetworkPathState;
use crate::upstream::{UpstreamError, UpstreamResult};

// ─── Policy ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempt budget per symbol.
    pub max_attempts:   u32,
    /// Fixed backoff after each rate-limited attempt.
    pub wait:           Duration,
    /// Rate-limit count that escalates the network path.
    pub escalate_after: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts:   10,
            wait:           Duration::from_secs(2),
            escalate_after: 3,
        }
    }
}

// ─── State Machine ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    /// `n` attempts made so far.
    Attempting(u32),
    Escalated,
    Succeeded,
    GaveUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GiveUpReason {
    /// Non-retryable upstream error.
    Upstream(String),
    /// Attempt budget spent on rate limits.
    Exhausted,
}

impl std::fmt::Display for GiveUpReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GiveUpReason::Upstream(msg) => f.write_str(msg),
            GiveUpReason::Exhausted => f.write_str("Too many errors: rate limit persisted"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryOutcome<T> {
    /// `Succeeded` or `GaveUp`.
    pub state:       AttemptState,
    pub result:      Result<T, GiveUpReason>,
    pub attempts:    u32,
    /// Times this loop passed through `Escalated`.
    pub escalations: u32,
}

pub struct RetryController<'a> {
    policy: &'a RetryPolicy,
    path:   &'a NetworkPathState,
}

impl<'a> RetryController<'a> {
    pub fn new(policy: &'a RetryPolicy, path: &'a NetworkPathState) -> Self {
        Self { policy, path }
    }

    /// Drive `op` until it succeeds, fails permanently or the budget runs out.
    pub fn run<T>(
        &self,
        symbol: &Symbol,
        mut op: impl FnMut() -> UpstreamResult<T>,
    ) -> RetryOutcome<T> {
        let max = self.policy.max_attempts;
        let mut state = AttemptState::Attempting(0);
        let mut attempts = 0;
        let mut escalations = 0;

        loop {
            match state {
                AttemptState::Attempting(n) if n >= max => {
                    error!(%symbol, attempts = n, "❌ Too many errors — giving up");
                    return RetryOutcome {
                        state: AttemptState::GaveUp,
                        result: Err(GiveUpReason::Exhausted),
                        attempts,
                        escalations,
                    };
                }

                AttemptState::Attempting(n) => {
                    attempts = n + 1;
                    match op() {
                        Ok(value) => {
                            return RetryOutcome {
                                state: AttemptState::Succeeded,
                                result: Ok(value),
                                attempts,
                                escalations,
                            };
                        }
                        Err(UpstreamError::RateLimited) => {
                            warn!(
                                %symbol,
                                attempt = attempts,
                                max_attempts = max,
                                wait = ?self.policy.wait,
                                "⏳ Rate limit reached — pausing"
                            );
                            thread::sleep(self.policy.wait);

                            state = if attempts == self.policy.escalate_after {
                                AttemptState::Escalated
                            } else {
                                AttemptState::Attempting(attempts)
                            };
                        }
                        Err(UpstreamError::Other(msg)) => {
                            error!(%symbol, attempt = attempts, error = %msg, "Upstream error — not retrying");
                            return RetryOutcome {
                                state: AttemptState::GaveUp,
                                result: Err(GiveUpReason::Upstream(msg)),
                                attempts,
                                escalations,
                            };
                        }
                    }
                }

                AttemptState::Escalated => {
                    escalations += 1;
                    if self.path.escalate() {
                        warn!(%symbol, attempt = attempts, "🧅 Escalating network path to Tor proxy for the rest of the process");
                    } else {
                        info!(%symbol, "Network path already escalated");
                    }
                    state = AttemptState::Attempting(attempts);
                }

                // Terminal states return directly above.
                AttemptState::Succeeded | AttemptState::GaveUp => unreachable!(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upstream::mock::sym;
    use std::cell::Cell;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts:   10,
            wait:           Duration::ZERO,
            escalate_after: 3,
        }
    }

    #[test]
    fn test_success_first_try() {
        let policy = fast_policy();
        let path = NetworkPathState::new();
        let outcome = RetryController::new(&policy, &path).run(&sym("AAPL"), || Ok(42));

        assert_eq!(outcome.state, AttemptState::Succeeded);
        assert_eq!(outcome.result, Ok(42));
        assert_eq!(outcome.attempts, 1);
        assert!(!path.is_escalated());
    }

    #[test]
    fn test_three_rate_limits_escalate_process_wide() {
        let policy = fast_policy();
        let path = NetworkPathState::new();
        let calls = Cell::new(0);

        let outcome = RetryController::new(&policy, &path).run(&sym("AAPL"), || {
            calls.set(calls.get() + 1);
            if calls.get() <= 3 {
                Err(UpstreamError::RateLimited)
            } else {
                Ok("chain")
            }
        });

        assert_eq!(outcome.state, AttemptState::Succeeded);
        assert_eq!(outcome.attempts, 4);
        assert_eq!(outcome.escalations, 1);
        assert!(path.is_escalated());

        // A later, unrelated symbol still sees the escalated path.
        let other = RetryController::new(&policy, &path).run(&sym("MSFT"), || Ok(()));
        assert_eq!(other.escalations, 0);
        assert!(path.is_escalated());
    }

    #[test]
    fn test_two_rate_limits_do_not_escalate() {
        let policy = fast_policy();
        let path = NetworkPathState::new();
        let calls = Cell::new(0);

        let outcome = RetryController::new(&policy, &path).run(&sym("AAPL"), || {
            calls.set(calls.get() + 1);
            if calls.get() <= 2 { Err(UpstreamError::RateLimited) } else { Ok(()) }
        });

        assert_eq!(outcome.attempts, 3);
        assert!(!path.is_escalated());
    }

    #[test]
    fn test_other_error_gives_up_after_one_attempt() {
        let policy = fast_policy();
        let path = NetworkPathState::new();
        let calls = Cell::new(0);

        let outcome: RetryOutcome<()> = RetryController::new(&policy, &path).run(&sym("ZZZZ"), || {
            calls.set(calls.get() + 1);
            Err(UpstreamError::other("symbol may be delisted"))
        });

        assert_eq!(outcome.state, AttemptState::GaveUp);
        assert_eq!(outcome.attempts, 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(
            outcome.result,
            Err(GiveUpReason::Upstream("symbol may be delisted".into()))
        );
        assert!(!path.is_escalated());
    }

    #[test]
    fn test_persistent_rate_limit_exhausts_and_escalates_once() {
        let policy = fast_policy();
        let path = NetworkPathState::new();
        let calls = Cell::new(0);

        let outcome: RetryOutcome<()> = RetryController::new(&policy, &path).run(&sym("AAPL"), || {
            calls.set(calls.get() + 1);
            Err(UpstreamError::RateLimited)
        });

        assert_eq!(outcome.state, AttemptState::GaveUp);
        assert_eq!(outcome.result, Err(GiveUpReason::Exhausted));
        assert_eq!(outcome.attempts, 10);
        assert_eq!(calls.get(), 10);
        assert_eq!(outcome.escalations, 1);
        assert!(path.is_escalated());
    }

    #[test]
    fn test_already_escalated_path_is_left_alone() {
        let policy = fast_policy();
        let path = NetworkPathState::new();
        path.escalate();

        let calls = Cell::new(0);
        let outcome = RetryController::new(&policy, &path).run(&sym("AAPL"), || {
            calls.set(calls.get() + 1);
            if calls.get() <= 3 { Err(UpstreamError::RateLimited) } else { Ok(()) }
        });

        assert_eq!(outcome.escalations, 1);
        assert!(path.is_escalated());
    }
}
