//! Exponential backoff retry for transient API failures.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

/// Determines if an error is worth retrying.
///
/// Implemented per error domain: connection failures, timeouts and
/// 429/5xx provider responses are transient; malformed responses and
/// client errors are not.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

/// Backoff policy for one client.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Ceiling for the backoff delay.
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }
}

/// Run an async operation, retrying transient failures with doubling
/// backoff plus jitter. Non-retryable errors are returned immediately.
pub async fn with_retry<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut delay = config.initial_delay;
    let mut attempt = 0;

    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if attempt < config.max_attempts && error.is_retryable() => {
                warn!(attempt, error = %error, delay_ms = delay.as_millis() as u64, "retrying");
                sleep(delay + jitter(delay / 4)).await;
                delay = (delay * 2).min(config.max_delay);
            }
            Err(error) => return Err(error),
        }
    }
}

/// Pseudo-random jitter up to `max`, to spread concurrent retries.
fn jitter(max: Duration) -> Duration {
    let max_ms = max.as_millis() as u64;
    if max_ms == 0 {
        return Duration::ZERO;
    }
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    Duration::from_millis(seed % max_ms)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug)]
    struct FakeError {
        transient: bool,
    }

    impl std::fmt::Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fake error (transient: {})", self.transient)
        }
    }

    impl Retryable for FakeError {
        fn is_retryable(&self) -> bool {
            self.transient
        }
    }

    fn fast() -> RetryConfig {
        RetryConfig::new(3).with_initial_delay(Duration::from_millis(1))
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, FakeError>(42)
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failure_then_success() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&fast(), || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(FakeError { transient: true })
            } else {
                Ok("ok")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FakeError { transient: false })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_attempts_exhausted() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&fast(), || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(FakeError { transient: true })
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
