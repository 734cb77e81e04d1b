//! Bounded retry for the connect step.
//!
//! Sessions never retry once connected. The only retry in the client wraps
//! the `Idle -> Connected` transition, and the default policy makes a single
//! attempt.

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::debug;

/// Attempt count and exponential backoff for connect retries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts including the first attempt.
    pub max_attempts: usize,
    /// Delay used before the first retry.
    pub initial_backoff: Duration,
    /// Upper bound for the doubling backoff.
    pub max_backoff: Duration,
    /// Maximum random jitter added to each delay.
    pub jitter: Duration,
}

impl RetryPolicy {
    /// A policy that makes exactly one attempt.
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            jitter: Duration::ZERO,
        }
    }

    /// Delay to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let mut delay = self.initial_backoff;
        for _ in 1..attempt {
            delay = std::cmp::min(delay.saturating_mul(2), self.max_backoff);
        }
        delay + jitter_duration(self.jitter, attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Run `op` until it succeeds, `should_retry` rejects the error, or the
/// policy runs out of attempts.
///
/// `op` receives the 1-based attempt number.
///
/// # Errors
///
/// Returns the error from the last attempt made.
pub async fn retry_async<T, E, Op, Fut, ShouldRetry>(
    policy: &RetryPolicy,
    mut op: Op,
    mut should_retry: ShouldRetry,
) -> Result<T, E>
where
    Op: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    ShouldRetry: FnMut(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(error) if attempt >= max_attempts || !should_retry(&error) => return Err(error),
            Err(_) => {
                let delay = policy.delay_for_attempt(attempt);
                debug!(
                    attempt,
                    max_attempts,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    "connect attempt failed, retrying"
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                attempt += 1;
            }
        }
    }
}

fn jitter_duration(max_jitter: Duration, attempt: usize) -> Duration {
    let limit_nanos = u64::try_from(max_jitter.as_nanos()).unwrap_or(u64::MAX);
    if limit_nanos == 0 {
        return Duration::ZERO;
    }

    let now_nanos = u64::from(
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos(),
    );
    let attempt = u64::try_from(attempt).unwrap_or(u64::MAX);
    let mixed = now_nanos ^ attempt.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    Duration::from_nanos(mixed % limit_nanos.saturating_add(1))
}
