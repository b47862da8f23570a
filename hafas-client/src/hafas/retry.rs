//! Retrying operations whose response came back incomplete.
//!
//! The reachability endpoint sometimes answers without `posL`. Such shape
//! errors are retried with exponential backoff; every other error surfaces
//! immediately.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::error::HafasError;

/// Exponential backoff without jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    pub factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            initial_delay: Duration::from_secs(2),
            factor: 2,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-indexed): 2s, 4s, 8s by default.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.initial_delay
            .saturating_mul(self.factor.saturating_pow(retry))
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the retries are used up. The last error is returned unchanged.
    pub async fn run<T, F, Fut>(&self, mut operation: F) -> Result<T, HafasError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HafasError>>,
    {
        let mut retry = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.retries => {
                    let delay = self.delay_for_retry(retry);
                    warn!(
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Operation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for_retry(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for_retry(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for_retry(2), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_third_attempt() {
        let attempts = &AtomicU32::new(0);
        let start = Instant::now();

        let result = RetryPolicy::default()
            .run(move || async move {
                if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(HafasError::shape("posL missing"))
                } else {
                    Ok("reachable")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "reachable");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        assert!(start.elapsed() >= Duration::from_secs(6));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_three_retries() {
        let attempts = &AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::default()
            .run(move || async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                Err(HafasError::shape(format!("posL missing ({n})")))
            })
            .await;

        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        assert_eq!(
            result.unwrap_err().to_string(),
            "invalid response: posL missing (3)"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn other_errors_are_not_retried() {
        let attempts = &AtomicU32::new(0);

        let result: Result<(), _> = RetryPolicy::default()
            .run(move || async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(HafasError::Protocol {
                    code: "FAIL".into(),
                    message: String::new(),
                })
            })
            .await;

        assert!(matches!(result, Err(HafasError::Protocol { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
