//! Generation Retry Logic
//!
//! Bounded exponential backoff for transient generation failures.
//!
//! **Algorithm:**
//! 1. Attempt operation
//! 2. If successful, return result
//! 3. If the error is transient (timeout, network, 5xx):
//!    a. If attempts remain: log WARN, back off, retry
//!    b. Otherwise: return the last error
//! 4. Any other error (quota, auth, bad reply) returns immediately
//!
//! **Backoff Strategy:**
//! - Initial delay: 250ms
//! - Max delay: 2000ms
//! - Multiplier: 2 (exponential)

use crate::extractors::generation::GenerationError;
use std::time::Duration;
use taxfill_common::config::MAX_ATTEMPTS_CEILING;

/// First backoff delay
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(250);

const MAX_BACKOFF: Duration = Duration::from_millis(2000);

/// How many times to try, and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    initial_backoff: Duration,
}

impl RetryPolicy {
    /// `max_attempts` is clamped to `1..=MAX_ATTEMPTS_CEILING`
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.clamp(1, MAX_ATTEMPTS_CEILING),
            initial_backoff: INITIAL_BACKOFF,
        }
    }

    /// Override the first backoff delay (tests use zero)
    pub fn with_initial_backoff(mut self, initial_backoff: Duration) -> Self {
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1
    fn backoff_after(&self, attempt: u32) -> Duration {
        let factor = 1u32 << (attempt.saturating_sub(1)).min(8);
        (self.initial_backoff * factor).min(MAX_BACKOFF.max(self.initial_backoff))
    }
}

impl Default for RetryPolicy {
    /// Single attempt, no retry
    fn default() -> Self {
        Self::new(1)
    }
}

/// Retry a generation call while it fails transiently
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., document id)
/// * `policy` - Attempt limit and backoff
/// * `operation` - Async closure performing one call
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    policy: RetryPolicy,
    mut operation: F,
) -> Result<T, GenerationError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, GenerationError>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        if attempt > 1 {
            tracing::debug!(
                operation = operation_name,
                attempt,
                "Retrying generation call"
            );
        }

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        "Generation call succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) => {
                if !err.is_transient() {
                    return Err(err);
                }

                if attempt >= policy.max_attempts {
                    if policy.max_attempts > 1 {
                        tracing::warn!(
                            operation = operation_name,
                            attempt,
                            error = %err,
                            "Generation call failed: retries exhausted"
                        );
                    }
                    return Err(err);
                }

                let delay = policy.backoff_after(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = delay.as_millis() as u64,
                    error = %err,
                    "Transient generation failure, backing off"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new(max_attempts).with_initial_backoff(Duration::ZERO)
    }

    #[test]
    fn test_policy_clamps_attempts() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
        assert_eq!(RetryPolicy::new(7).max_attempts(), MAX_ATTEMPTS_CEILING);
        assert_eq!(RetryPolicy::default().max_attempts(), 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(3);
        assert_eq!(policy.backoff_after(1), Duration::from_millis(250));
        assert_eq!(policy.backoff_after(2), Duration::from_millis(500));
        assert_eq!(policy.backoff_after(6), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_transient_error_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = retry_transient("doc", fast(3), || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(GenerationError::Transient("503".into()))
                } else {
                    Ok("reply")
                }
            }
        })
        .await;

        assert_eq!(result, Ok("reply"));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_quota_error_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = retry_transient("doc", fast(3), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(GenerationError::Quota("429".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(GenerationError::Quota(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_single_attempt_default_does_not_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<(), _> = retry_transient("doc", RetryPolicy::default(), || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(GenerationError::Timeout("60s".into()))
            }
        })
        .await;

        assert!(matches!(result, Err(GenerationError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
