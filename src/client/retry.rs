use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::AppError;

/// Bounded exponential backoff for store calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay after the `attempt`-th failure (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Runs `call` until it succeeds, fails permanently, or attempts run out.
    /// Non-idempotent calls are only repeated when the request never left.
    pub async fn run<T, F, Fut>(&self, op: &str, idempotent: bool, mut call: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut attempt = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.max_attempts && should_retry(&e, idempotent) => {
                    let delay = self.delay_for(attempt);
                    warn!("{} failed (attempt {}/{}), retrying in {:?}: {}", op, attempt, self.max_attempts, delay, e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn should_retry(error: &AppError, idempotent: bool) -> bool {
    if idempotent {
        error.is_transient()
    } else {
        error.is_connect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn quick(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
        }
    }

    #[test]
    fn test_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
        assert_eq!(policy.delay_for(10), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = quick(3)
            .run("list", true, move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(AppError::Store { status: 503, body: String::new() })
                } else {
                    Ok(5)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 5);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_attempts_are_bounded() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<(), _> = quick(2)
            .run("list", true, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Store { status: 502, body: String::new() })
            })
            .await;

        assert!(matches!(result, Err(AppError::Store { status: 502, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_and_non_idempotent_failures_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let _: Result<(), _> = quick(3)
            .run("update", true, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Store { status: 400, body: String::new() })
            })
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        let counter = AtomicU32::new(0);
        let calls = &counter;
        let _: Result<(), _> = quick(3)
            .run("create", false, move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(AppError::Store { status: 503, body: String::new() })
            })
            .await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
