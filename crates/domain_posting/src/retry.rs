//! Bounded retry with exponential backoff
//!
//! Transient storage failures (contention, timeouts) are retried a fixed
//! number of times with a doubling delay. Deterministic domain failures
//! are surfaced immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::PostingError;

/// Retry policy for transient failures
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum attempts including the first
    pub max_attempts: u32,
    /// Delay before the second attempt; doubles on each retry
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Delay before the given retry attempt (attempt 1 is the first retry)
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Runs the operation, retrying transient failures with backoff
    ///
    /// The closure receives the attempt number starting at 1. A
    /// non-transient error aborts immediately; exhausting the budget on a
    /// transient error returns [`PostingError::RetriesExhausted`].
    pub async fn run<T, F, Fut>(&self, operation: &str, mut f: F) -> Result<T, PostingError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, PostingError>>,
    {
        let mut attempt = 1;
        loop {
            match f(attempt).await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_transient() && attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        %operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        %error,
                        "Transient failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) if error.is_transient() => {
                    return Err(PostingError::RetriesExhausted {
                        operation: operation.to_string(),
                        attempts: attempt,
                        last_error: error.to_string(),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }
}
