//! Hub store client.
//!
//! The hub store is owned by the platform's administrative service. Its
//! proximity query is approximate (bounding-box first), so callers must
//! re-check results with the exact distance; `HubResolver` does.

use async_trait::async_trait;

use crate::domain::{Hub, HubId};
use crate::geo::Point;

use super::error::StoreError;
use super::{StoreClientConfig, decode_response};

/// Read access to the platform's hub inventory.
#[async_trait]
pub trait HubStore: Send + Sync {
    /// Hubs near a point, by the store's approximate proximity filter.
    /// May include hubs outside the radius and inactive hubs.
    async fn hubs_near(&self, point: Point, radius_m: f64) -> Result<Vec<Hub>, StoreError>;

    /// A single hub by id, if it exists.
    async fn hub_by_id(&self, id: &HubId) -> Result<Option<Hub>, StoreError>;

    /// All active hubs.
    async fn active_hubs(&self) -> Result<Vec<Hub>, StoreError>;
}

/// HTTP client for the hub service.
#[derive(Debug, Clone)]
pub struct HttpHubStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpHubStore {
    pub fn new(config: StoreClientConfig) -> Result<Self, StoreError> {
        Ok(Self {
            http: config.build_client()?,
            base_url: config.base_url,
        })
    }
}

#[async_trait]
impl HubStore for HttpHubStore {
    async fn hubs_near(&self, point: Point, radius_m: f64) -> Result<Vec<Hub>, StoreError> {
        let url = format!("{}/hubs/near", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("lat", point.lat().to_string()),
                ("lon", point.lon().to_string()),
                ("radius_m", radius_m.to_string()),
            ])
            .send()
            .await?;

        decode_response(response).await
    }

    async fn hub_by_id(&self, id: &HubId) -> Result<Option<Hub>, StoreError> {
        let url = format!("{}/hubs/{}", self.base_url, id);
        let response = self.http.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        decode_response(response).await.map(Some)
    }

    async fn active_hubs(&self) -> Result<Vec<Hub>, StoreError> {
        let url = format!("{}/hubs", self.base_url);
        let response = self.http.get(&url).query(&[("active", "true")]).send().await?;

        decode_response(response).await
    }
}
