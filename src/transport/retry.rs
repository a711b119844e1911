//! Bounded retry with exponential backoff and jitter

use super::TransportError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

/// Retry behavior applied to every transport call
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first (never zero)
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each retry
    pub initial_backoff: Duration,
    /// Cap on the backoff delay
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// Run `call` until success, a fatal error, or `max_attempts` is exhausted.
///
/// The caller's closure must re-issue the identical request each time (same
/// cursor, same query); pagination state only advances after a success.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut call: F,
) -> Result<T, TransportError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut delay = policy.initial_backoff;
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match call().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < max_attempts => {
                let wait = jittered(delay);
                tracing::warn!(
                    operation,
                    attempt,
                    wait_ms = wait.as_millis() as u64,
                    error = %error,
                    "transient failure, retrying"
                );
                sleep(wait).await;
                delay = (delay * 2).min(policy.max_backoff);
            }
            Err(error) => {
                if error.is_retryable() {
                    tracing::error!(operation, attempts = attempt, error = %error, "retries exhausted");
                }
                return Err(error);
            }
        }
    }
}

/// Backoff plus up to 25% additive jitter to avoid thundering retries
fn jittered(base: Duration) -> Duration {
    let base_ms = base.as_millis() as u64;
    let jitter_range = (base_ms / 4).max(1);
    let jitter = rand::thread_rng().gen_range(0..jitter_range);
    base + Duration::from_millis(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_without_retry() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&policy(4), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, TransportError>(7) }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_exactly_max_attempts_on_persistent_timeout() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&policy(4), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TransportError::Timeout("deadline".into())) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn fatal_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(&policy(4), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(TransportError::Status {
                    status: 404,
                    body: "missing".into(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(&policy(4), "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TransportError::Status {
                        status: 503,
                        body: String::new(),
                    })
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
