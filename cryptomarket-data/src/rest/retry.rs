use crate::error::DataError;
use serde::Deserialize;
use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::warn;

/// Configuration for exponential backoff retry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Minimum backoff after a [`DataError::RateLimit`] without a `Retry-After`.
    pub rate_limit_backoff: Duration,
    /// Multiplier applied after each failed attempt.
    pub multiplier: u32,
    /// Maximum number of retry attempts.
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
            rate_limit_backoff: Duration::from_secs(10),
            multiplier: 2,
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// Backoff before retrying after `error`, given the current exponential backoff.
    pub fn backoff_after(&self, error: &DataError, backoff: Duration) -> Duration {
        match error {
            DataError::RateLimit {
                retry_after: Some(retry_after),
                ..
            } => backoff.max(*retry_after),
            DataError::RateLimit {
                retry_after: None, ..
            } => backoff.max(self.rate_limit_backoff),
            _ => backoff,
        }
    }
}

/// Execute a future-producing closure with exponential backoff retry.
///
/// The `should_retry` closure determines whether a given error is retriable.
/// Returns the first success, or the last error after all retries are exhausted.
pub async fn retry_with_backoff<F, Fut, T, E>(
    policy: &RetryPolicy,
    should_retry: impl Fn(&E) -> bool,
    operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    retry_with_backoff_hook(policy, should_retry, |_, backoff| backoff, operation).await
}

/// [`retry_with_backoff`] where `wait` maps each retriable error and the current exponential
/// backoff to the actual sleep before the next attempt.
pub async fn retry_with_backoff_hook<F, Fut, T, E>(
    policy: &RetryPolicy,
    should_retry: impl Fn(&E) -> bool,
    mut wait: impl FnMut(&E, Duration) -> Duration,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut backoff = policy.initial_backoff;

    for _ in 0..policy.max_retries {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) if should_retry(&error) => error,
            Err(error) => return Err(error),
        };

        sleep(wait(&error, backoff)).await;
        backoff = (backoff * policy.multiplier).min(policy.max_backoff);
    }

    // Final attempt after all retries.
    operation().await
}

/// [`retry_with_backoff`] specialised to [`DataError`]: retries [`DataError::is_retryable`]
/// errors and waits at least the rate limit backoff after a [`DataError::RateLimit`].
pub async fn retry_data_request<F, Fut, T>(policy: &RetryPolicy, operation: F) -> Result<T, DataError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DataError>>,
{
    let mut attempt = 0_u32;

    retry_with_backoff_hook(
        policy,
        DataError::is_retryable,
        |error, backoff| {
            let wait = policy.backoff_after(error, backoff);
            warn!(%error, attempt, ?wait, "retrying request");
            attempt += 1;
            wait
        },
        operation,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryptomarket_instrument::exchange::ExchangeId;
    use std::sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
    };

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(10),
            rate_limit_backoff: Duration::from_secs(10),
            multiplier: 2,
            max_retries: 3,
        }
    }

    fn rate_limit(retry_after: Option<Duration>) -> DataError {
        DataError::RateLimit {
            exchange: ExchangeId::Bitfinex,
            retry_after,
        }
    }

    #[test]
    fn test_default_retry_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.initial_backoff, Duration::from_millis(500));
        assert_eq!(policy.max_backoff, Duration::from_secs(30));
        assert_eq!(policy.rate_limit_backoff, Duration::from_secs(10));
        assert_eq!(policy.multiplier, 2);
        assert_eq!(policy.max_retries, 3);
    }

    #[test]
    fn test_backoff_after() {
        let policy = fast_policy();
        let backoff = Duration::from_millis(4);

        assert_eq!(
            policy.backoff_after(&rate_limit(None), backoff),
            Duration::from_secs(10)
        );
        assert_eq!(
            policy.backoff_after(&rate_limit(Some(Duration::from_secs(2))), backoff),
            Duration::from_secs(2)
        );
        assert_eq!(
            policy.backoff_after(&DataError::InvalidArgument("x".to_owned()), backoff),
            backoff
        );
    }

    #[tokio::test]
    async fn test_retry_succeeds_immediately() {
        let policy = RetryPolicy::default();
        let result: Result<&str, &str> =
            retry_with_backoff(&policy, |_: &&str| true, || async { Ok("ok") }).await;
        assert_eq!(result, Ok("ok"));
    }

    #[tokio::test]
    async fn test_retry_non_retriable_error_returns_immediately() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result: Result<(), &str> = retry_with_backoff(
            &fast_policy(),
            |_: &&str| false,
            move || {
                attempts_clone.fetch_add(1, Ordering::SeqCst);
                async { Err("non-retriable") }
            },
        )
        .await;

        assert_eq!(result, Err("non-retriable"));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_exhausts_all_retries() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result: Result<(), &str> = retry_with_backoff(
            &fast_policy(),
            |_: &&str| true,
            move || {
                attempts_clone.fetch_add(1, Ordering::SeqCst);
                async { Err("always fails") }
            },
        )
        .await;

        assert_eq!(result, Err("always fails"));
        // max_retries (3) + 1 final attempt = 4 total
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_with_backoff_hook_sees_exponential_backoff() {
        let mut backoffs = Vec::new();

        let result: Result<(), &str> = retry_with_backoff_hook(
            &fast_policy(),
            |_: &&str| true,
            |_, backoff| {
                backoffs.push(backoff);
                Duration::ZERO
            },
            || async { Err("always fails") },
        )
        .await;

        assert_eq!(result, Err("always fails"));
        assert_eq!(
            backoffs,
            vec![
                Duration::from_millis(1),
                Duration::from_millis(2),
                Duration::from_millis(4)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_data_request_honours_retry_after() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let started = tokio::time::Instant::now();
        let result = retry_data_request(&fast_policy(), move || {
            let count = attempts_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                match count {
                    0 => Err(rate_limit(Some(Duration::from_secs(2)))),
                    1 => Err(DataError::Http {
                        exchange: ExchangeId::Gdax,
                        status: 502,
                        message: "bad gateway".to_owned(),
                    }),
                    _ => Ok("success"),
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // 2s Retry-After then a 2ms exponential backoff
        assert!(started.elapsed() >= Duration::from_millis(2002));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_data_request_waits_rate_limit_backoff() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let started = tokio::time::Instant::now();
        let result = retry_data_request(&fast_policy(), move || {
            let count = attempts_clone.fetch_add(1, Ordering::SeqCst);
            async move {
                match count {
                    0 => Err(rate_limit(None)),
                    _ => Ok("success"),
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "success");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_retry_data_request_does_not_retry_client_errors() {
        let attempts = Arc::new(AtomicU32::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result: Result<(), DataError> = retry_data_request(&fast_policy(), move || {
            attempts_clone.fetch_add(1, Ordering::SeqCst);
            async {
                Err(DataError::Http {
                    exchange: ExchangeId::Gdax,
                    status: 400,
                    message: "bad request".to_owned(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(DataError::Http { status: 400, .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
