//! Candidate route retrieval and decoration.
//!
//! The pool for a request is the union of two store queries: routes
//! explicitly associated with the resolved hub pair, and (for routes
//! published before hub associations existed) routes whose geometry
//! passes near both hubs. The raw (pre-decoration) route set is cached
//! per (hub pair, weekday, time bucket); decoration depends on the
//! request's exact coordinates and time, so it is always recomputed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Datelike, NaiveTime, Timelike, Weekday};
use tracing::{debug, warn};

use crate::cache::{ResultCache, cache_key};
use crate::domain::{Hub, MatchRequest, Route};
use crate::stores::{RouteStore, StoreError, TimeWindow, retry_once_transient};

use super::config::MatchConfig;
use super::stops;

/// How a candidate matched the resolved hub pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HubMatch {
    /// The route carries an explicit association with both hubs.
    Exact,
    /// The route matched via the geometry fallback.
    Geometry,
}

/// A route provisionally compatible with a request, decorated with the
/// request-specific deltas. Ephemeral, lives for one orchestration pass.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub route: Arc<Route>,
    /// Distance from the request origin to the route's nearest stop.
    pub origin_distance_m: f64,
    /// Distance from the request destination to the route's nearest stop.
    pub destination_distance_m: f64,
    /// Route departure minus desired departure, in minutes. Negative
    /// means the route leaves earlier than the rider asked for.
    pub time_delta_min: i64,
    pub hub_match: HubMatch,
}

/// Signed minute difference between two times of day, taking the short
/// way around midnight. Result is in [-720, 720).
fn signed_minutes_delta(route: NaiveTime, desired: NaiveTime) -> i64 {
    let route_min = i64::from(route.hour() * 60 + route.minute());
    let desired_min = i64::from(desired.hour() * 60 + desired.minute());
    (route_min - desired_min + 720).rem_euclid(1440) - 720
}

/// Fetches and decorates the candidate pool for a resolved hub pair.
pub struct CandidateFetcher {
    store: Arc<dyn RouteStore>,
    cache: ResultCache,
    config: Arc<MatchConfig>,
}

impl CandidateFetcher {
    pub fn new(store: Arc<dyn RouteStore>, cache: ResultCache, config: Arc<MatchConfig>) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    /// The decorated candidate pool for a request, before hard filters.
    pub async fn fetch(
        &self,
        origin_hub: &Hub,
        destination_hub: &Hub,
        request: &MatchRequest,
    ) -> Result<Vec<Candidate>, StoreError> {
        let weekday = request.departure.weekday();
        let desired_time = request.departure.time();
        let window = TimeWindow::around(desired_time, self.config.time_tolerance());

        let routes = self
            .routes_for_pair(origin_hub, destination_hub, weekday, window, desired_time)
            .await?;

        let candidates = routes
            .into_iter()
            .filter_map(|route| self.decorate(route, origin_hub, destination_hub, request))
            .collect();

        Ok(candidates)
    }

    /// The pre-decoration route set, from cache or the store.
    async fn routes_for_pair(
        &self,
        origin_hub: &Hub,
        destination_hub: &Hub,
        weekday: Weekday,
        window: TimeWindow,
        desired_time: NaiveTime,
    ) -> Result<Vec<Route>, StoreError> {
        let key = cache_key(
            "candidate-routes",
            &[
                ("origin_hub", origin_hub.id.to_string()),
                ("destination_hub", destination_hub.id.to_string()),
                ("weekday", weekday.num_days_from_monday().to_string()),
                (
                    "time_bucket",
                    self.config.time_bucket(desired_time).to_string(),
                ),
            ],
        );

        if let Some(routes) = self.cache.get_json::<Vec<Route>>("candidate_routes", &key).await {
            return Ok(routes);
        }

        let by_pair = retry_once_transient("hub-pair route query", self.config.retry_backoff, || {
            self.store.active_routes_by_hub_pair(
                &origin_hub.id,
                &destination_hub.id,
                weekday,
                window,
            )
        })
        .await?;

        let by_geometry =
            retry_once_transient("geometry route query", self.config.retry_backoff, || {
                self.store.active_routes_near(
                    origin_hub.location,
                    destination_hub.location,
                    self.config.geometry_fallback_radius_m,
                    weekday,
                    window,
                )
            })
            .await?;

        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(by_pair.len() + by_geometry.len());
        for route in by_pair.into_iter().chain(by_geometry) {
            if !seen.insert(route.id.clone()) {
                continue;
            }
            if !route.is_active() {
                continue;
            }
            if let Err(e) = route.validate() {
                warn!(route = %route.id, error = %e, "skipping invalid route from store");
                continue;
            }
            routes.push(route);
        }

        debug!(
            origin_hub = %origin_hub.id,
            destination_hub = %destination_hub.id,
            pool = routes.len(),
            "fetched candidate route set"
        );

        self.cache
            .put_json("candidate_routes", &key, &routes, self.config.candidate_cache_ttl)
            .await;

        Ok(routes)
    }

    /// Attach request-specific deltas. Returns `None` when the route's
    /// departure falls outside the exact tolerance window. The cache
    /// bucket is coarser than the window, so this re-check keeps
    /// behaviour identical with and without a cache hit.
    fn decorate(
        &self,
        route: Route,
        origin_hub: &Hub,
        destination_hub: &Hub,
        request: &MatchRequest,
    ) -> Option<Candidate> {
        let time_delta_min = signed_minutes_delta(route.departure_time, request.departure.time());
        if time_delta_min.abs() > self.config.time_tolerance_min {
            return None;
        }

        let (_, origin_distance_m) = stops::nearest_stop(&route, request.origin)?;
        let (_, destination_distance_m) = stops::nearest_stop(&route, request.destination)?;

        let hub_match = if route.origin_hub.as_ref() == Some(&origin_hub.id)
            && route.destination_hub.as_ref() == Some(&destination_hub.id)
        {
            HubMatch::Exact
        } else {
            HubMatch::Geometry
        };

        Some(Candidate {
            route: Arc::new(route),
            origin_distance_m,
            destination_distance_m,
            time_delta_min,
            hub_match,
        })
    }
}
