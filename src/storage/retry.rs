//! Retry policy for remote operations
//!
//! An explicit decorator around the backend's network calls: transient
//! failures are retried with bounded exponential backoff and jitter,
//! permanent failures (authorization, validation, missing objects)
//! surface immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::AppError;

const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_BASE_DELAY_MS: u64 = 200;
const DEFAULT_MAX_DELAY_MS: u64 = 5_000;

/// Bounded exponential backoff schedule
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: Duration::from_millis(DEFAULT_BASE_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    /// Delay after the given failed attempt (1-based): doubled per
    /// attempt, capped, plus up to 50% random jitter.
    fn delay_after(&self, attempt: u32) -> Duration {
        let doubled = self
            .base_delay
            .saturating_mul(1_u32 << (attempt - 1).min(16));
        let capped = doubled.min(self.max_delay);
        let jitter_ms = rand::thread_rng().gen_range(0..=capped.as_millis() as u64 / 2);
        capped + Duration::from_millis(jitter_ms)
    }
}

/// Run `call` until it succeeds, the error is permanent, or the attempt
/// budget is exhausted.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_transient() && attempt < policy.max_attempts => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation = %operation,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Transient remote failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RetryPolicy, with_retry};
    use crate::error::AppError;
    use std::cell::Cell;
    use std::time::Duration;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    #[tokio::test]
    async fn transient_failure_is_retried_until_success() {
        let calls = Cell::new(0_u32);
        let result = with_retry(&fast_policy(), "download", || {
            calls.set(calls.get() + 1);
            let call = calls.get();
            async move {
                if call < 3 {
                    Err(AppError::transfer("connection reset", true))
                } else {
                    Ok(call)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn attempt_budget_is_bounded() {
        let calls = Cell::new(0_u32);
        let result: Result<(), _> = with_retry(&fast_policy(), "upload", || {
            calls.set(calls.get() + 1);
            async { Err(AppError::transfer("connection reset", true)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn permanent_failure_is_not_retried() {
        let calls = Cell::new(0_u32);
        let result: Result<(), _> = with_retry(&fast_policy(), "list", || {
            calls.set(calls.get() + 1);
            async { Err(AppError::transfer("access denied", false)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let calls = Cell::new(0_u32);
        let result: Result<(), _> = with_retry(&fast_policy(), "download", || {
            calls.set(calls.get() + 1);
            async { Err(AppError::RemoteNotFound("news/2025-12-17.db".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(AppError::RemoteNotFound(_))));
        assert_eq!(calls.get(), 1);
    }
}
