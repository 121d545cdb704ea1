//! In-memory store implementations for tests and local development.
//!
//! The proximity queries here deliberately mimic a real store's
//! approximate behaviour: `hubs_near` filters by bounding box, not exact
//! distance, so consumers that skip the exact re-check will see corner
//! artifacts, the same way they would in production.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Weekday;

use crate::domain::{DriverId, Hub, HubId, Route};
use crate::geo::{self, Point};

use super::error::StoreError;
use super::hubs::HubStore;
use super::routes::{RouteStore, TimeWindow};
use super::stats::{DriverStats, DriverStatsProvider};

/// Meters per degree of latitude (and of longitude at the equator).
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Hub store backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryHubStore {
    hubs: Vec<Hub>,
}

impl InMemoryHubStore {
    pub fn new(hubs: Vec<Hub>) -> Self {
        Self { hubs }
    }
}

#[async_trait]
impl HubStore for InMemoryHubStore {
    async fn hubs_near(&self, point: Point, radius_m: f64) -> Result<Vec<Hub>, StoreError> {
        if !(radius_m > 0.0) {
            return Err(StoreError::InvalidQuery("radius must be positive"));
        }

        // Bounding-box prefilter, like a store-side index would do.
        // Corners of the box are sqrt(2) beyond the radius; callers
        // re-check exactly.
        let dlat = radius_m / METERS_PER_DEGREE;
        let dlon = radius_m / (METERS_PER_DEGREE * point.lat().to_radians().cos().max(0.01));

        Ok(self
            .hubs
            .iter()
            .filter(|h| {
                (h.location.lat() - point.lat()).abs() <= dlat
                    && (h.location.lon() - point.lon()).abs() <= dlon
            })
            .cloned()
            .collect())
    }

    async fn hub_by_id(&self, id: &HubId) -> Result<Option<Hub>, StoreError> {
        Ok(self.hubs.iter().find(|h| &h.id == id).cloned())
    }

    async fn active_hubs(&self) -> Result<Vec<Hub>, StoreError> {
        Ok(self.hubs.iter().filter(|h| h.active).cloned().collect())
    }
}

/// Route store backed by a fixed list.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRouteStore {
    routes: Vec<Route>,
}

impl InMemoryRouteStore {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    fn schedule_matches(route: &Route, weekday: Weekday, window: TimeWindow) -> bool {
        route.runs_on(weekday) && window.contains(route.departure_time)
    }
}

#[async_trait]
impl RouteStore for InMemoryRouteStore {
    async fn active_routes_by_hub_pair(
        &self,
        origin: &HubId,
        destination: &HubId,
        weekday: Weekday,
        window: TimeWindow,
    ) -> Result<Vec<Route>, StoreError> {
        Ok(self
            .routes
            .iter()
            .filter(|r| {
                r.is_active()
                    && r.origin_hub.as_ref() == Some(origin)
                    && r.destination_hub.as_ref() == Some(destination)
                    && Self::schedule_matches(r, weekday, window)
            })
            .cloned()
            .collect())
    }

    async fn active_routes_near(
        &self,
        origin: Point,
        destination: Point,
        radius_m: f64,
        weekday: Weekday,
        window: TimeWindow,
    ) -> Result<Vec<Route>, StoreError> {
        if !(radius_m > 0.0) {
            return Err(StoreError::InvalidQuery("radius must be positive"));
        }

        Ok(self
            .routes
            .iter()
            .filter(|r| {
                r.is_active()
                    && (r.origin_hub.is_none() || r.destination_hub.is_none())
                    && Self::schedule_matches(r, weekday, window)
                    && r.stops
                        .iter()
                        .any(|s| geo::within(s.location, origin, radius_m))
                    && r.stops
                        .iter()
                        .any(|s| geo::within(s.location, destination, radius_m))
            })
            .cloned()
            .collect())
    }
}

/// Stats provider backed by a fixed map.
#[derive(Debug, Clone, Default)]
pub struct StaticDriverStats {
    stats: HashMap<DriverId, DriverStats>,
}

impl StaticDriverStats {
    pub fn new(stats: HashMap<DriverId, DriverStats>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl DriverStatsProvider for StaticDriverStats {
    async fn stats(&self, driver: &DriverId) -> Result<Option<DriverStats>, StoreError> {
        Ok(self.stats.get(driver).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub(id: &str, lat: f64, lon: f64, active: bool) -> Hub {
        Hub {
            id: HubId::parse(id).unwrap(),
            name: id.to_string(),
            location: Point::new(lat, lon).unwrap(),
            area: "test".to_string(),
            active,
        }
    }

    #[tokio::test]
    async fn bounding_box_includes_corner_overshoot() {
        let center = Point::new(6.5244, 3.3792).unwrap();
        // Diagonal corner: ~0.009 deg on both axes is ~1000 m per axis,
        // ~1400 m crow-flies: inside the 1000 m box, outside the circle.
        let corner = hub("corner", 6.5244 + 0.0089, 3.3792 + 0.0089, true);
        let store = InMemoryHubStore::new(vec![corner]);

        let found = store.hubs_near(center, 1_000.0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(!geo::within(found[0].location, center, 1_000.0));
    }

    #[tokio::test]
    async fn rejects_non_positive_radius() {
        let store = InMemoryHubStore::new(vec![]);
        let center = Point::new(6.5244, 3.3792).unwrap();
        assert!(store.hubs_near(center, 0.0).await.is_err());
        assert!(store.hubs_near(center, -5.0).await.is_err());
    }

    #[tokio::test]
    async fn hub_by_id_and_active_listing() {
        let store = InMemoryHubStore::new(vec![
            hub("a", 6.5, 3.3, true),
            hub("b", 6.6, 3.4, false),
        ]);

        let a = HubId::parse("a").unwrap();
        assert!(store.hub_by_id(&a).await.unwrap().is_some());
        let missing = HubId::parse("zzz").unwrap();
        assert!(store.hub_by_id(&missing).await.unwrap().is_none());

        let active = store.active_hubs().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, a);
    }
}
