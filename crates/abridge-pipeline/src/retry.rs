//! Bounded retry with fixed-step backoff.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;

/// Retry policy shared by every oracle call site.
///
/// Backoff is fixed-step: the delay before attempt `n+1` is `n * base_delay`.
/// Attempts are bounded; callers treat final failure as a hard stop for the
/// run, never an infinite loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first.
    pub max_attempts: u32,
    /// Base delay unit for backoff.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Runs `attempt` up to `max_attempts` times.
    ///
    /// Non-retryable errors are returned immediately. `operation` only
    /// labels log lines.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        mut attempt: F,
    ) -> std::result::Result<T, abridge_oracle::Error>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, abridge_oracle::Error>>,
    {
        let mut tries = 0u32;
        loop {
            tries += 1;
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if !err.is_retryable() => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        operation,
                        attempt = tries,
                        error = %err,
                        "Operation failed with non-retryable error"
                    );
                    return Err(err);
                }
                Err(err) if tries >= self.max_attempts => {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        operation,
                        attempt = tries,
                        error = %err,
                        "Operation failed, attempts exhausted"
                    );
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.base_delay * tries;
                    tracing::warn!(
                        target: TRACING_TARGET,
                        operation,
                        attempt = tries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use abridge_oracle::Error as OracleError;

    use super::*;

    fn instant() -> RetryPolicy {
        RetryPolicy::new(3, Duration::ZERO)
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = instant()
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(OracleError::EmptyResponse)
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let calls = AtomicU32::new(0);
        let result: std::result::Result<(), _> = instant()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(OracleError::EmptyResponse) }
            })
            .await;
        assert!(matches!(result.unwrap_err(), OracleError::EmptyResponse));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_fails_fast() {
        let calls = AtomicU32::new(0);
        let result: std::result::Result<(), _> = instant()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(OracleError::config("bad key")) }
            })
            .await;
        assert!(matches!(result.unwrap_err(), OracleError::Config(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
