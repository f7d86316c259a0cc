//! Backoff controller: bounded rate-limit retries around one outbound call.
//!
//! ## Retry Strategy
//!
//! Only rate-limit signals are retried. The wait before retry `n + 1` is
//! `base_delay * 2^n` plus a uniform jitter in `[0, max_jitter)`; with the
//! defaults (2 s base, 0.5 s jitter, 5 attempts) the waits are roughly
//! 2 s → 4 s → 8 s → 16 s, after which the call gives up. Jitter keeps
//! independent callers from retrying in lockstep.
//!
//! Every other failure surfaces at once as [`CallError::Transport`].
//!
//! The operation reports [`TransportError`] and the controller returns
//! [`CallError`]; the two types never mix, so a terminal failure produced
//! here cannot be caught again by an enclosing retry loop.

use crate::error::{CallError, TransportError};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Attempt bound and delay parameters for [`execute_with_backoff`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total invocations allowed, including the first. Default: 5.
    pub max_attempts: u32,
    /// Delay unit doubled after each rate-limited attempt. Default: 2 s.
    pub base_delay: Duration,
    /// Upper bound (exclusive) of the random jitter. Default: 500 ms.
    pub max_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(2),
            max_jitter: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Exponential part of the delay after the 0-indexed `attempt` failed.
    pub fn base_delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(1_u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX))
    }

    /// Full delay after the 0-indexed `attempt` failed: exponential part plus jitter.
    ///
    /// Always within `[base_delay * 2^attempt, base_delay * 2^attempt + max_jitter)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay_for(attempt).saturating_add(self.jitter())
    }

    /// Uniform draw from `[0, max_jitter)` at nanosecond resolution.
    fn jitter(&self) -> Duration {
        let bound = u64::try_from(self.max_jitter.as_nanos()).unwrap_or(u64::MAX);
        if bound == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rand::thread_rng().gen_range(0..bound))
    }
}

/// Run `operation` until it succeeds, fails hard, or exhausts the rate-limit budget.
///
/// `operation` is invoked at most `policy.max_attempts` times (at least once).
/// The attempt counter lives on this call's stack; concurrent callers never
/// share retry state.
pub async fn execute_with_backoff<T, F, Fut>(
    policy: &RetryPolicy,
    mut operation: F,
) -> Result<T, CallError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt: u32 = 0;

    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 0 {
                    debug!("Call succeeded after {} retries", attempt);
                }
                return Ok(value);
            }
            Err(TransportError::RateLimited(detail)) => {
                if attempt + 1 >= max_attempts {
                    return Err(CallError::RateLimited {
                        attempts: max_attempts,
                        detail,
                    });
                }
                let delay = policy.delay_for(attempt);
                warn!(
                    "Rate limit hit (attempt {}/{}). Retrying in {:.2} seconds...",
                    attempt + 1,
                    max_attempts,
                    delay.as_secs_f64()
                );
                sleep(delay).await;
                attempt += 1;
            }
            Err(TransportError::Failed(detail)) => {
                return Err(CallError::Transport { detail });
            }
        }
    }
}
