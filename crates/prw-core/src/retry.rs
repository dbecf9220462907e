//! Retry policy around the count source.
//!
//! One query attempt can fail three ways (see `SourceError`) and each
//! class gets different treatment: transient failures retry with
//! exponential backoff against an attempt cap, rate limits sleep to the
//! reset hint (or a fallback schedule) against a separate wait cap, and
//! invalid queries fail immediately. Sleeping goes through the `Sleeper`
//! trait so tests never block.

use std::time::Duration;

use tracing::warn;

use crate::query::SearchQuery;
use crate::source::{CountSource, SourceError};

/// Suspension point for politeness and backoff waits.
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

/// Sleeper that blocks the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

impl<F> Sleeper for F
where
    F: FnMut(Duration),
{
    fn sleep(&mut self, duration: Duration) {
        self(duration)
    }
}

/// How failures of each class are retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed per query for transient failures.
    pub max_attempts: u32,

    /// Backoff before transient retry `k` (1-based): `base * 2^(k-1)`.
    pub transient_base: Duration,

    /// Fallback wait before rate-limit retry `k` (0-based) when the
    /// source gives no reset hint: `base * 2^k`.
    pub rate_limit_base: Duration,

    /// Rate-limit waits allowed per query. Tracked separately from the
    /// transient attempt cap so throttling does not eat real attempts,
    /// while still bounding a permanently throttled source.
    pub max_rate_limit_waits: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            transient_base: Duration::from_secs(1),
            rate_limit_base: Duration::from_secs(60),
            max_rate_limit_waits: 3,
        }
    }
}

impl RetryPolicy {
    fn transient_backoff(&self, retries_done: u32) -> Duration {
        self.transient_base * 2u32.saturating_pow(retries_done)
    }

    fn rate_limit_wait(&self, waits_done: u32) -> Duration {
        self.rate_limit_base * 2u32.saturating_pow(waits_done)
    }
}

/// Resolve one query through the source under `policy`.
///
/// Returns the first successful count, or the last error once the
/// relevant cap is exhausted. `InvalidQuery` is returned immediately.
pub fn fetch_count<S, Z>(
    source: &mut S,
    query: &SearchQuery,
    policy: &RetryPolicy,
    sleeper: &mut Z,
) -> Result<u64, SourceError>
where
    S: CountSource,
    Z: Sleeper,
{
    let mut attempts: u32 = 0;
    let mut rate_limit_waits: u32 = 0;

    loop {
        match source.count(query) {
            Ok(count) => return Ok(count),
            Err(SourceError::InvalidQuery) => {
                warn!(query = %query, "query rejected as invalid, not retrying");
                return Err(SourceError::InvalidQuery);
            }
            Err(SourceError::RateLimited { retry_after }) => {
                if rate_limit_waits >= policy.max_rate_limit_waits {
                    warn!(query = %query, waits = rate_limit_waits, "rate-limit wait cap exhausted");
                    return Err(SourceError::RateLimited { retry_after });
                }
                let wait = retry_after.unwrap_or_else(|| policy.rate_limit_wait(rate_limit_waits));
                warn!(
                    query = %query,
                    wait_secs = wait.as_secs(),
                    hinted = retry_after.is_some(),
                    "rate limited, waiting"
                );
                sleeper.sleep(wait);
                rate_limit_waits += 1;
            }
            Err(err @ SourceError::Unavailable(_)) => {
                attempts += 1;
                if attempts >= policy.max_attempts {
                    warn!(query = %query, attempts, error = %err, "transient failures exhausted attempts");
                    return Err(err);
                }
                let backoff = policy.transient_backoff(attempts - 1);
                warn!(
                    query = %query,
                    attempt = attempts,
                    backoff_secs = backoff.as_secs(),
                    error = %err,
                    "transient failure, retrying"
                );
                sleeper.sleep(backoff);
            }
        }
    }
}
