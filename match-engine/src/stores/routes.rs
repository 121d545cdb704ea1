//! Route store client.
//!
//! The route store is owned by the route-management service. Two query
//! shapes exist: the primary hub-pair lookup, and a geometry fallback
//! for routes published before hub associations were modelled.

use async_trait::async_trait;
use chrono::{Duration, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::{HubId, Route};
use crate::geo::Point;

use super::error::StoreError;
use super::{StoreClientConfig, decode_response};

/// A departure time-of-day window, possibly wrapping midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    /// The window centred on `center`, extending `tolerance` either way.
    /// Wraps across midnight when the tolerance crosses it.
    pub fn around(center: NaiveTime, tolerance: Duration) -> Self {
        Self {
            start: center.overflowing_sub_signed(tolerance).0,
            end: center.overflowing_add_signed(tolerance).0,
        }
    }

    /// Whether a departure time falls inside the window.
    pub fn contains(&self, t: NaiveTime) -> bool {
        if self.start <= self.end {
            self.start <= t && t <= self.end
        } else {
            // Wrapped: e.g. 23:30..00:30.
            t >= self.start || t <= self.end
        }
    }
}

/// Read access to published routes.
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// ACTIVE routes associated with the given hub pair, running on
    /// `weekday` with a departure inside `window`. Stops are returned
    /// eager-loaded.
    async fn active_routes_by_hub_pair(
        &self,
        origin: &HubId,
        destination: &HubId,
        weekday: Weekday,
        window: TimeWindow,
    ) -> Result<Vec<Route>, StoreError>;

    /// Geometry fallback: ACTIVE routes without a full hub association
    /// whose traversal passes within `radius_m` of both endpoints.
    /// The store's proximity filter is approximate.
    async fn active_routes_near(
        &self,
        origin: Point,
        destination: Point,
        radius_m: f64,
        weekday: Weekday,
        window: TimeWindow,
    ) -> Result<Vec<Route>, StoreError>;
}

/// HTTP client for the route service.
#[derive(Debug, Clone)]
pub struct HttpRouteStore {
    http: reqwest::Client,
    base_url: String,
}

impl HttpRouteStore {
    pub fn new(config: StoreClientConfig) -> Result<Self, StoreError> {
        Ok(Self {
            http: config.build_client()?,
            base_url: config.base_url,
        })
    }
}

#[async_trait]
impl RouteStore for HttpRouteStore {
    async fn active_routes_by_hub_pair(
        &self,
        origin: &HubId,
        destination: &HubId,
        weekday: Weekday,
        window: TimeWindow,
    ) -> Result<Vec<Route>, StoreError> {
        let url = format!("{}/routes/active", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("origin_hub", origin.to_string()),
                ("destination_hub", destination.to_string()),
                ("weekday", weekday.num_days_from_monday().to_string()),
                ("window_start", window.start.format("%H:%M").to_string()),
                ("window_end", window.end.format("%H:%M").to_string()),
            ])
            .send()
            .await?;

        decode_response(response).await
    }

    async fn active_routes_near(
        &self,
        origin: Point,
        destination: Point,
        radius_m: f64,
        weekday: Weekday,
        window: TimeWindow,
    ) -> Result<Vec<Route>, StoreError> {
        let url = format!("{}/routes/active/near", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("origin_lat", origin.lat().to_string()),
                ("origin_lon", origin.lon().to_string()),
                ("destination_lat", destination.lat().to_string()),
                ("destination_lon", destination.lon().to_string()),
                ("radius_m", radius_m.to_string()),
                ("weekday", weekday.num_days_from_monday().to_string()),
                ("window_start", window.start.format("%H:%M").to_string()),
                ("window_end", window.end.format("%H:%M").to_string()),
            ])
            .send()
            .await?;

        decode_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn window_contains_plain() {
        let w = TimeWindow::around(t(7, 0), Duration::minutes(60));
        assert_eq!(w.start, t(6, 0));
        assert_eq!(w.end, t(8, 0));
        assert!(w.contains(t(7, 0)));
        assert!(w.contains(t(6, 0)));
        assert!(w.contains(t(8, 0)));
        assert!(!w.contains(t(5, 59)));
        assert!(!w.contains(t(8, 1)));
    }

    #[test]
    fn window_wraps_midnight() {
        let w = TimeWindow::around(t(23, 45), Duration::minutes(60));
        assert_eq!(w.start, t(22, 45));
        assert_eq!(w.end, t(0, 45));
        assert!(w.contains(t(23, 0)));
        assert!(w.contains(t(0, 30)));
        assert!(!w.contains(t(1, 0)));
        assert!(!w.contains(t(12, 0)));
    }

    #[test]
    fn window_wraps_just_after_midnight() {
        let w = TimeWindow::around(t(0, 15), Duration::minutes(60));
        assert!(w.contains(t(23, 30)));
        assert!(w.contains(t(0, 0)));
        assert!(w.contains(t(1, 0)));
        assert!(!w.contains(t(2, 0)));
    }
}
