//! Driver aggregate stats provider.
//!
//! Ratings and trip counts are maintained out-of-band by the analytics
//! pipeline and refreshed on a minutes-scale interval; the engine only
//! reads them and tolerates staleness up to that interval. A missing or
//! failed lookup is never fatal; scoring substitutes a neutral rating.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::cache::{ResultCache, cache_key};
use crate::domain::DriverId;

use super::error::StoreError;
use super::{StoreClientConfig, decode_response};

/// Periodically refreshed aggregates for one driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverStats {
    /// Average rating on a 0-5 scale.
    pub rating: f32,
    pub completed_trips: u32,
}

/// Read access to driver aggregates.
#[async_trait]
pub trait DriverStatsProvider: Send + Sync {
    /// Stats for one driver; `None` for drivers with no history yet.
    async fn stats(&self, driver: &DriverId) -> Result<Option<DriverStats>, StoreError>;
}

/// HTTP client for the driver-stats service.
#[derive(Debug, Clone)]
pub struct HttpDriverStats {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDriverStats {
    pub fn new(config: StoreClientConfig) -> Result<Self, StoreError> {
        Ok(Self {
            http: config.build_client()?,
            base_url: config.base_url,
        })
    }
}

#[async_trait]
impl DriverStatsProvider for HttpDriverStats {
    async fn stats(&self, driver: &DriverId) -> Result<Option<DriverStats>, StoreError> {
        let url = format!("{}/drivers/{}/stats", self.base_url, driver);
        let response = self.http.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        decode_response(response).await.map(Some)
    }
}

/// Caching decorator over any stats provider.
///
/// Stats change slowly, so both present and absent answers are cached
/// for the configured TTL.
pub struct CachedDriverStats {
    inner: Arc<dyn DriverStatsProvider>,
    cache: ResultCache,
    ttl: Duration,
}

impl CachedDriverStats {
    pub fn new(inner: Arc<dyn DriverStatsProvider>, cache: ResultCache, ttl: Duration) -> Self {
        Self { inner, cache, ttl }
    }
}

#[async_trait]
impl DriverStatsProvider for CachedDriverStats {
    async fn stats(&self, driver: &DriverId) -> Result<Option<DriverStats>, StoreError> {
        let key = cache_key("driver-stats", &[("driver", driver.to_string())]);

        if let Some(cached) = self
            .cache
            .get_json::<Option<DriverStats>>("driver_stats", &key)
            .await
        {
            return Ok(cached);
        }

        let fresh = self.inner.stats(driver).await?;
        self.cache
            .put_json("driver_stats", &key, &fresh, self.ttl)
            .await;

        Ok(fresh)
    }
}
