//! Bounded retry around remote calls.

use crate::error::UpdateError;
use backon::{ExponentialBuilder, Retryable};
use reqwest::StatusCode;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Attempt budget and backoff bounds for [`retry_on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
        }
    }
}

/// Run `operation`, retrying with exponential backoff while `should_retry`
/// accepts the error and the attempt budget lasts.
pub async fn retry_on<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    operation: F,
    should_retry: P,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: FnMut(&E) -> bool,
    E: Display,
{
    let backoff = ExponentialBuilder::default()
        .with_min_delay(policy.min_delay)
        .with_max_delay(policy.max_delay)
        .with_max_times(policy.max_attempts.saturating_sub(1));

    operation
        .retry(backoff)
        .when(should_retry)
        .notify(|err: &E, delay: Duration| {
            tracing::warn!("Retrying in {:?} after error: {}", delay, err);
        })
        .await
}

/// Predicate matching remote failures whose HTTP status is one of `codes`
pub fn on_status(codes: &[StatusCode]) -> impl Fn(&UpdateError) -> bool + '_ {
    move |err: &UpdateError| err.status().is_some_and(|status| codes.contains(&status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gcp::http::ApiStatusError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            min_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
        }
    }

    fn remote(status: StatusCode) -> UpdateError {
        UpdateError::RemoteCallFailed(
            ApiStatusError {
                status,
                message: None,
            }
            .into(),
        )
    }

    #[tokio::test]
    async fn test_retries_matching_status_until_success() {
        let attempts = AtomicUsize::new(0);

        let result = retry_on(
            &fast_policy(5),
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(remote(StatusCode::CONFLICT))
                    } else {
                        Ok(n)
                    }
                }
            },
            on_status(&[StatusCode::CONFLICT]),
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_stops_after_attempt_budget() {
        let attempts = AtomicUsize::new(0);

        let result: Result<(), UpdateError> = retry_on(
            &fast_policy(3),
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(remote(StatusCode::CONFLICT)) }
            },
            on_status(&[StatusCode::CONFLICT]),
        )
        .await;

        assert_eq!(result.unwrap_err().status(), Some(StatusCode::CONFLICT));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_matching_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);

        let result: Result<(), UpdateError> = retry_on(
            &fast_policy(5),
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(remote(StatusCode::FORBIDDEN)) }
            },
            on_status(&[StatusCode::CONFLICT]),
        )
        .await;

        tokio_test::assert_err!(result);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_local_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);

        let result: Result<(), UpdateError> = retry_on(
            &fast_policy(5),
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(UpdateError::NoFieldsSpecified) }
            },
            on_status(&[StatusCode::CONFLICT]),
        )
        .await;

        assert!(matches!(result, Err(UpdateError::NoFieldsSpecified)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
