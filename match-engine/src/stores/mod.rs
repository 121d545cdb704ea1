//! Clients for the external collaborators the engine reads from.
//!
//! Each store is consumed behind a trait so the orchestrator can be
//! wired against the platform's HTTP services in production and against
//! in-memory implementations in tests. Connection lifecycle belongs to
//! the process entry point; the engine receives already-built clients.

use std::time::Duration;

use serde::de::DeserializeOwned;

mod error;
mod hubs;
pub mod mock;
mod routes;
mod stats;

pub use error::{StoreError, retry_once_transient};
pub use hubs::{HttpHubStore, HubStore};
pub use routes::{HttpRouteStore, RouteStore, TimeWindow};
pub use stats::{CachedDriverStats, DriverStats, DriverStatsProvider, HttpDriverStats};

/// Default timeout for store requests. Kept below the candidate-fetch
/// and hard request timeouts so an inner deadline always fires first.
const DEFAULT_TIMEOUT_SECS: u64 = 1;

/// Shared configuration for the HTTP store clients.
#[derive(Debug, Clone)]
pub struct StoreClientConfig {
    /// Base URL of the service, e.g. `http://hub-service.internal/api/v1`.
    pub base_url: String,
    /// Optional API key sent as `x-api-key`.
    pub api_key: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl StoreClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the underlying reqwest client.
    pub(crate) fn build_client(&self) -> Result<reqwest::Client, StoreError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if let Some(key) = &self.api_key {
            let value = reqwest::header::HeaderValue::from_str(key)
                .map_err(|_| StoreError::InvalidQuery("API key is not a valid header value"))?;
            headers.insert("x-api-key", value);
        }

        Ok(reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?)
    }
}

/// Map a store response to a decoded body or a `StoreError`.
async fn decode_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, StoreError> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(StoreError::Unauthorized);
    }
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(StoreError::RateLimited);
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Api {
            status: status.as_u16(),
            message: body,
        });
    }

    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| StoreError::Json {
        message: e.to_string(),
    })
}
