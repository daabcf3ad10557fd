//! Retry with exponential backoff for transient storage failures.

use std::{fmt::Display, future::Future, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

/// Whether an error may go away if the operation is attempted again.
pub trait IsTransient {
    fn is_transient(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(2),
            multiplier: 2,
        }
    }
}

impl RetryConfig {
    fn next_delay(&self, delay: Duration) -> Duration {
        delay.saturating_mul(self.multiplier).min(self.max_delay)
    }
}

/// Run `operation` until it succeeds, fails permanently, or runs out of attempts.
///
/// `operation` receives the 1-based attempt number.
///
/// # Errors
///
/// Returns the last error seen.
pub async fn retry_on_transient<F, Fut, T, E>(config: RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display + IsTransient,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        attempt += 1;

        match operation(attempt).await {
            Ok(value) => {
                if attempt > 1 {
                    info!(attempt, "operation succeeded after retry");
                }

                return Ok(value);
            }
            Err(error) if !error.is_transient() || attempt >= config.max_attempts.max(1) => {
                return Err(error);
            }
            Err(error) => {
                warn!(
                    attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    %error,
                    "transient failure, retrying"
                );

                sleep(delay).await;

                delay = config.next_delay(delay);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    use thiserror::Error;

    use super::*;

    #[derive(Debug, Error)]
    enum TestError {
        #[error("try again")]
        Transient,

        #[error("give up")]
        Permanent,
    }

    impl IsTransient for TestError {
        fn is_transient(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    fn config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            multiplier: 2,
        }
    }

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = retry_on_transient(config(3), |_attempt| {
            let calls = Arc::clone(&calls);

            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok("done")
                }
            }
        })
        .await;

        assert!(matches!(result, Ok("done")), "expected Ok, got {result:?}");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = retry_on_transient(config(5), |_attempt| {
            let calls = Arc::clone(&calls);

            async move {
                calls.fetch_add(1, Ordering::SeqCst);

                Err(TestError::Permanent)
            }
        })
        .await;

        assert!(matches!(result, Err(TestError::Permanent)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = retry_on_transient(config(2), |attempt| {
            let calls = Arc::clone(&calls);

            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                assert!(attempt <= 2);

                Err(TestError::Transient)
            }
        })
        .await;

        assert!(matches!(result, Err(TestError::Transient)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn delay_is_capped() {
        let config = config(3);

        assert_eq!(
            config.next_delay(Duration::from_millis(1)),
            Duration::from_millis(2)
        );
        assert_eq!(
            config.next_delay(Duration::from_millis(4)),
            Duration::from_millis(5)
        );
    }
}
