//! Retry utilities for transient upload failures.
//!
//! Provides classification of retryable storage errors, linear backoff, and
//! the `with_retry` combinator that drives any fallible async operation.

use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::UploadConfig;
use crate::error::StorageError;

/// Substrings that mark a backend message as a transport problem.
const TRANSIENT_PATTERNS: &[&str] = &[
    "network",
    "timeout",
    "timed out",
    "failed to fetch",
    "fetch failed",
    "connection",
    "econnreset",
    "econnrefused",
    "socket hang up",
];

/// Determine whether a storage error is worth retrying.
///
/// Retryable: network failures, timeouts, and backend messages that describe
/// a transport problem. Non-retryable: permission, quota and missing-bucket
/// errors, unsupported operations, cancellation.
pub fn is_retryable(error: &StorageError) -> bool {
    match error {
        StorageError::Network(_) | StorageError::Timeout { .. } => true,
        StorageError::Backend { message, .. } => {
            let message = message.to_lowercase();
            TRANSIENT_PATTERNS.iter().any(|p| message.contains(p))
        }
        StorageError::Unsupported(_) | StorageError::Cancelled => false,
    }
}

/// Something that can wait. Injected so tests can observe backoff delays
/// without sleeping.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Attempt budget and backoff schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Attempt N is followed by a wait of `N * backoff_base`
    pub backoff_base: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &UploadConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
        }
    }

    /// Linear backoff after the given (1-based) failed attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&UploadConfig::default())
    }
}

/// Why `with_retry` gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    Exhausted { error: E, attempts: u32 },
    /// A non-retryable error stopped the loop
    Permanent { error: E, attempts: u32 },
    /// Cancelled while waiting to retry
    Cancelled { attempts: u32 },
}

impl<E> RetryError<E> {
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. }
            | RetryError::Permanent { attempts, .. }
            | RetryError::Cancelled { attempts } => *attempts,
        }
    }
}

/// Run `op` until it succeeds, fails permanently, or the budget runs out.
///
/// `op` receives the 1-based attempt number. Returns the value together with
/// the number of attempts it took.
pub async fn with_retry<T, E, F, Fut, R>(
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
    cancel: &CancellationToken,
    is_retryable: R,
    mut op: F,
) -> Result<(T, u32), RetryError<E>>
where
    E: Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let error = match op(attempt).await {
            Ok(value) => return Ok((value, attempt)),
            Err(error) => error,
        };

        if !is_retryable(&error) {
            return Err(RetryError::Permanent {
                error,
                attempts: attempt,
            });
        }
        if attempt >= max_attempts {
            return Err(RetryError::Exhausted {
                error,
                attempts: attempt,
            });
        }

        let delay = policy.backoff(attempt);
        tracing::warn!("Attempt {attempt}/{max_attempts} failed: {error}; retrying in {delay:?}");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(RetryError::Cancelled { attempts: attempt }),
            _ = sleeper.sleep(delay) => {}
        }
        attempt += 1;
    }
}

/// Sleeper that records requested delays and returns immediately.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSleeper {
    delays: std::sync::Mutex<Vec<Duration>>,
}

#[cfg(test)]
impl RecordingSleeper {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff_base: Duration::from_millis(1000),
        }
    }

    #[test]
    fn test_network_and_timeout_are_retryable() {
        assert!(is_retryable(&StorageError::Network("connection reset".into())));
        assert!(is_retryable(&StorageError::Timeout { timeout_ms: 30_000 }));
    }

    #[test]
    fn test_transport_looking_backend_message_is_retryable() {
        let err = StorageError::backend(Some(504), Some("Gateway Timeout".into()));
        assert!(is_retryable(&err));
        let err = StorageError::backend(None, Some("TypeError: Network request failed".into()));
        assert!(is_retryable(&err));
    }

    #[test]
    fn test_storage_errors_not_retryable() {
        for message in [
            "new row violates row-level security policy",
            "Bucket not found",
            "The object exceeded the maximum allowed size",
            "Storage quota exceeded",
        ] {
            let err = StorageError::backend(Some(400), Some(message.into()));
            assert!(!is_retryable(&err), "{message} should not be retryable");
        }
    }

    #[test]
    fn test_cancelled_and_unsupported_not_retryable() {
        assert!(!is_retryable(&StorageError::Cancelled));
        assert!(!is_retryable(&StorageError::Unsupported("list_buckets")));
    }

    #[test]
    fn test_backoff_linear() {
        let policy = policy();
        assert_eq!(policy.backoff(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff(2), Duration::from_millis(2000));
        assert_eq!(policy.backoff(3), Duration::from_millis(3000));
    }

    #[test]
    fn test_policy_from_default_config() {
        assert_eq!(RetryPolicy::default(), policy());
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_after_transient_failures() {
        let sleeper = RecordingSleeper::default();
        let calls = AtomicU32::new(0);
        let result = with_retry(
            &policy(),
            &sleeper,
            &CancellationToken::new(),
            |_: &String| true,
            |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 3 {
                        Err(format!("attempt {attempt} failed"))
                    } else {
                        Ok("done")
                    }
                }
            },
        )
        .await;

        assert_eq!(result, Ok(("done", 3)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(1000), Duration::from_millis(2000)]
        );
    }

    #[tokio::test]
    async fn test_with_retry_stops_on_permanent_error() {
        let sleeper = RecordingSleeper::default();
        let result: Result<((), u32), _> = with_retry(
            &policy(),
            &sleeper,
            &CancellationToken::new(),
            |_: &String| false,
            |_| async { Err("denied".to_string()) },
        )
        .await;

        assert_eq!(
            result,
            Err(RetryError::Permanent {
                error: "denied".to_string(),
                attempts: 1
            })
        );
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_with_retry_exhausts_budget() {
        let sleeper = RecordingSleeper::default();
        let result: Result<((), u32), _> = with_retry(
            &policy(),
            &sleeper,
            &CancellationToken::new(),
            |_: &String| true,
            |attempt| async move { Err(format!("failure {attempt}")) },
        )
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts(), 3);
        assert_eq!(
            err,
            RetryError::Exhausted {
                error: "failure 3".to_string(),
                attempts: 3
            }
        );
        assert_eq!(sleeper.delays().len(), 2);
    }

    #[tokio::test]
    async fn test_with_retry_cancelled_during_backoff() {
        let sleeper = RecordingSleeper::default();
        let cancel = CancellationToken::new();
        let result: Result<((), u32), _> = with_retry(
            &policy(),
            &sleeper,
            &cancel,
            |_: &String| true,
            |_| {
                cancel.cancel();
                async { Err("flaky".to_string()) }
            },
        )
        .await;

        assert_eq!(result, Err(RetryError::Cancelled { attempts: 1 }));
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_with_retry_zero_budget_still_runs_once() {
        let policy = RetryPolicy {
            max_attempts: 0,
            ..policy()
        };
        let result = with_retry(
            &policy,
            &RecordingSleeper::default(),
            &CancellationToken::new(),
            |_: &String| true,
            |_| async { Ok::<_, String>(7) },
        )
        .await;
        assert_eq!(result, Ok((7, 1)));
    }
}
