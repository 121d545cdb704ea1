//! Feature extraction for scoring.
//!
//! Every candidate is reduced to a fixed-shape vector before scoring.
//! The order below is the contract between the extractor and every
//! scoring strategy; it never changes without a coordinated model
//! retrain. All components are scaled into [0, 1] and oriented so 1.0
//! is best, using fixed normalization constants from `MatchConfig`;
//! those constants must be identical across requests for scores to be
//! comparable. Raw signed deltas stay on the candidate for the
//! user-facing response.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::candidates::HubMatch;
use super::config::MatchConfig;
use super::stops::ValidatedCandidate;

/// Number of features in a vector.
pub const FEATURE_COUNT: usize = 7;

/// Feature names, in vector order:
/// 0. `origin_proximity`: boarding-stop closeness to the rider's origin
/// 1. `destination_proximity`: alighting-stop closeness to the destination
/// 2. `schedule_alignment`: departure closeness to the desired time
/// 3. `price_value`: cheapness against the configured price ceiling
/// 4. `seat_availability`: free-seat fraction of the vehicle
/// 5. `driver_rating`: rating on a 0-1 scale, neutral when unknown
/// 6. `hub_match_quality`: 1.0 exact hub match, fractional for geometry
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "origin_proximity",
    "destination_proximity",
    "schedule_alignment",
    "price_value",
    "seat_availability",
    "driver_rating",
    "hub_match_quality",
];

/// Ceiling for geometry-fallback hub-match quality, keeping it strictly
/// below an exact hub association.
const GEOMETRY_QUALITY_CAP: f64 = 0.8;

/// A candidate's features, in the documented fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Build a vector, clamping every component into [0, 1].
    pub fn new(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            values: values.map(|v| v.clamp(0.0, 1.0)),
        }
    }

    pub fn values(&self) -> &[f64; FEATURE_COUNT] {
        &self.values
    }

    pub fn hub_match_quality(&self) -> f64 {
        self.values[6]
    }
}

/// Derives feature vectors from validated candidates.
#[derive(Clone)]
pub struct FeatureExtractor {
    config: Arc<MatchConfig>,
}

impl FeatureExtractor {
    pub fn new(config: Arc<MatchConfig>) -> Self {
        Self { config }
    }

    pub fn extract(&self, vc: &ValidatedCandidate, rating: Option<f32>) -> FeatureVector {
        let config = &self.config;
        let route = &vc.candidate.route;

        let origin_proximity = 1.0 - (vc.plan.board_distance_m / config.stop_radius_m).min(1.0);
        let destination_proximity =
            1.0 - (vc.plan.alight_distance_m / config.stop_radius_m).min(1.0);

        let tolerance = config.time_tolerance_min as f64;
        let schedule_alignment =
            1.0 - (vc.candidate.time_delta_min.unsigned_abs() as f64 / tolerance).min(1.0);

        let price_value = 1.0 - (vc.price / config.price_ceiling).min(1.0);

        let seat_availability = if route.seats_total == 0 {
            0.0
        } else {
            f64::from(route.seats_available) / f64::from(route.seats_total)
        };

        let driver_rating = f64::from(rating.unwrap_or(config.neutral_rating)) / 5.0;

        let hub_match_quality = match vc.candidate.hub_match {
            HubMatch::Exact => 1.0,
            HubMatch::Geometry => {
                // Fractional boardable-proximity score: how close the
                // matched stops actually are, capped below exact.
                let proximity = (origin_proximity + destination_proximity) / 2.0;
                GEOMETRY_QUALITY_CAP * proximity
            }
        };

        FeatureVector::new([
            origin_proximity,
            destination_proximity,
            schedule_alignment,
            price_value,
            seat_availability,
            driver_rating,
            hub_match_quality,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        DriverId, Route, RouteId, RouteStatus, RouteStop, VehicleId, WeekdaySet,
    };
    use crate::geo::Point;
    use crate::matching::candidates::Candidate;
    use crate::matching::stops::BoardingPlan;
    use chrono::NaiveTime;

    fn stop(seq: u32, lat: f64, lon: f64) -> RouteStop {
        RouteStop {
            sequence: seq,
            name: format!("stop-{seq}"),
            location: Point::new(lat, lon).unwrap(),
            arrival_offset_min: seq * 20,
            price_from_origin: f64::from(seq) * 500.0,
        }
    }

    fn route() -> Route {
        Route {
            id: RouteId::parse("r1").unwrap(),
            driver: DriverId::parse("d1").unwrap(),
            vehicle: VehicleId::parse("v1").unwrap(),
            stops: vec![stop(0, 6.5246, 3.3790), stop(1, 6.4283, 3.4217)],
            departure_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            weekdays: WeekdaySet::every_day(),
            seats_total: 4,
            seats_available: 2,
            base_price: 500.0,
            currency: "NGN".to_string(),
            status: RouteStatus::Active,
            origin_hub: None,
            destination_hub: None,
        }
    }

    fn validated(
        hub_match: HubMatch,
        board_distance_m: f64,
        alight_distance_m: f64,
        time_delta_min: i64,
        price: f64,
    ) -> ValidatedCandidate {
        ValidatedCandidate {
            candidate: Candidate {
                route: std::sync::Arc::new(route()),
                origin_distance_m: board_distance_m,
                destination_distance_m: alight_distance_m,
                time_delta_min,
                hub_match,
            },
            plan: BoardingPlan {
                board_idx: 0,
                alight_idx: 1,
                board_distance_m,
                alight_distance_m,
            },
            price,
            ride_minutes: 20,
            detour_min: 0,
        }
    }

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(Arc::new(MatchConfig::default()))
    }

    #[test]
    fn exact_hub_match_scores_full_quality() {
        let vc = validated(HubMatch::Exact, 0.0, 0.0, 0, 0.0);
        let fv = extractor().extract(&vc, Some(5.0));

        assert_eq!(fv.hub_match_quality(), 1.0);
        // Perfect candidate: everything at 1.0 except seat ratio.
        assert_eq!(fv.values()[0], 1.0);
        assert_eq!(fv.values()[1], 1.0);
        assert_eq!(fv.values()[2], 1.0);
        assert_eq!(fv.values()[3], 1.0);
        assert_eq!(fv.values()[4], 0.5);
        assert_eq!(fv.values()[5], 1.0);
    }

    #[test]
    fn geometry_match_quality_is_fractional() {
        let vc = validated(HubMatch::Geometry, 0.0, 0.0, 0, 500.0);
        let fv = extractor().extract(&vc, None);

        assert!(fv.hub_match_quality() > 0.0);
        assert!(fv.hub_match_quality() < 1.0);

        // Farther stops lower the quality further.
        let far = validated(HubMatch::Geometry, 400.0, 400.0, 0, 500.0);
        let fv_far = extractor().extract(&far, None);
        assert!(fv_far.hub_match_quality() < fv.hub_match_quality());
    }

    #[test]
    fn unknown_rating_is_neutral() {
        let vc = validated(HubMatch::Exact, 100.0, 100.0, 10, 500.0);
        let fv = extractor().extract(&vc, None);
        assert_eq!(fv.values()[5], 3.5 / 5.0);
    }

    #[test]
    fn deltas_scale_linearly() {
        let vc = validated(HubMatch::Exact, 250.0, 0.0, 30, 2_500.0);
        let fv = extractor().extract(&vc, None);

        assert_eq!(fv.values()[0], 0.5); // 250 of 500 m
        assert_eq!(fv.values()[2], 0.5); // 30 of 60 min
        assert_eq!(fv.values()[3], 0.5); // 2500 of 5000
    }

    #[test]
    fn out_of_range_inputs_clamp() {
        // Distances and prices beyond the normalization constants pin
        // the feature at 0 rather than going negative.
        let vc = validated(HubMatch::Exact, 2_000.0, 0.0, 300, 50_000.0);
        let fv = extractor().extract(&vc, Some(9.9));

        assert_eq!(fv.values()[0], 0.0);
        assert_eq!(fv.values()[2], 0.0);
        assert_eq!(fv.values()[3], 0.0);
        // Rating above 5 clamps to 1.
        assert_eq!(fv.values()[5], 1.0);
    }
}
