//! Bounded retry with a fixed backoff.
//!
//! A lookup is attempted up to [`RetryPolicy::max_attempts`] times. Transient errors
//! (see [`Error::is_transient`]) wait [`RetryPolicy::delay`] and try again; anything else,
//! or the last failed attempt, ends the word.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::{Error, Result};

/// Default attempts per word, counting the first one.
pub const DEFAULT_RETRY_LIMIT: u32 = 3;

/// Default wait between two attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Decision on whether to retry a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    Retry {
        delay: Duration,
        /// Number of the attempt about to be made (1-indexed).
        attempt: u32,
    },
    DoNotRetry {
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_LIMIT, DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// `max_attempts` is clamped to at least one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// `attempt` is the 1-indexed attempt that just failed with `error`.
    pub fn should_retry(&self, error: &Error, attempt: u32) -> RetryDecision {
        if !error.is_transient() {
            return RetryDecision::DoNotRetry {
                reason: "not a transient error".to_string(),
            };
        }
        if attempt >= self.max_attempts {
            return RetryDecision::DoNotRetry {
                reason: format!("max attempts ({}) exhausted", self.max_attempts),
            };
        }
        RetryDecision::Retry {
            delay: self.delay,
            attempt: attempt + 1,
        }
    }
}

/// Outcome of [`retry`]: the final result plus how many attempts it took.
#[derive(Debug)]
pub struct Attempted<T> {
    pub result: Result<T>,
    pub attempts: u32,
}

/// Runs `op` until it succeeds or `policy` gives up. `op` receives the attempt number.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Attempted<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        let err = match op(attempt).await {
            Ok(value) => {
                return Attempted {
                    result: Ok(value),
                    attempts: attempt,
                }
            }
            Err(err) => err,
        };

        match policy.should_retry(&err, attempt) {
            RetryDecision::Retry {
                delay,
                attempt: next,
            } => {
                debug!(attempt, next, delay_ms = delay.as_millis() as u64, error = %err, "will retry");
                tokio::time::sleep(delay).await;
                attempt = next;
            }
            RetryDecision::DoNotRetry { reason } => {
                debug!(attempt, reason = %reason, error = %err, "giving up");
                return Attempted {
                    result: Err(err),
                    attempts: attempt,
                };
            }
        }
    }
}
