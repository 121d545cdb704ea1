//! Store client error types and the transient-retry policy.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// Errors from the external store clients (hub store, route store,
/// driver stats, scoring model).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// HTTP transport failed (connection refused, reset, timeout inside
    /// the client).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A layered deadline fired around the call.
    #[error("{what} timed out")]
    Timeout { what: &'static str },

    /// The store answered with an error status.
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// The store answered 2xx but the body didn't decode.
    #[error("JSON parse error: {message}")]
    Json { message: String },

    /// Invalid credentials for the store.
    #[error("unauthorized (invalid API key)")]
    Unauthorized,

    /// The store is shedding load.
    #[error("rate limited by store")]
    RateLimited,

    /// The query itself is malformed (non-positive radius and the like).
    /// Rejected locally, no request is sent.
    #[error("invalid query: {0}")]
    InvalidQuery(&'static str),
}

impl StoreError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Transport failures, timeouts, rate limiting and 5xx responses are
    /// transient; auth, decode and client-side errors are not.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(_) | StoreError::Timeout { .. } | StoreError::RateLimited => true,
            StoreError::Api { status, .. } => *status >= 500,
            StoreError::Json { .. } | StoreError::Unauthorized | StoreError::InvalidQuery(_) => {
                false
            }
        }
    }
}

/// Run `op`, retrying exactly once after `backoff` if the first attempt
/// fails with a transient error. Non-transient errors surface
/// immediately.
pub async fn retry_once_transient<T, F, Fut>(
    what: &'static str,
    backoff: Duration,
    op: F,
) -> Result<T, StoreError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    match op().await {
        Err(e) if e.is_transient() => {
            warn!(what, error = %e, backoff_ms = backoff.as_millis() as u64, "transient store error, retrying once");
            tokio::time::sleep(backoff).await;
            op().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn transience_classification() {
        assert!(StoreError::Timeout { what: "hub query" }.is_transient());
        assert!(StoreError::RateLimited.is_transient());
        assert!(
            StoreError::Api {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            !StoreError::Api {
                status: 400,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!StoreError::Unauthorized.is_transient());
        assert!(
            !StoreError::Json {
                message: "bad".into()
            }
            .is_transient()
        );
        assert!(!StoreError::InvalidQuery("radius").is_transient());
    }

    #[tokio::test]
    async fn retries_once_on_transient() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, StoreError> =
            retry_once_transient("test", Duration::ZERO, || async {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(StoreError::Timeout { what: "test" })
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_non_transient() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, StoreError> =
            retry_once_transient("test", Duration::ZERO, || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Unauthorized)
            })
            .await;

        assert!(matches!(result, Err(StoreError::Unauthorized)));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_second_failure() {
        let attempts = AtomicU32::new(0);
        let result: Result<u32, StoreError> =
            retry_once_transient("test", Duration::ZERO, || async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::RateLimited)
            })
            .await;

        assert!(matches!(result, Err(StoreError::RateLimited)));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }
}
