//! Stop-sequence validation.
//!
//! A route is boardable for a rider only when the stop nearest their
//! origin comes strictly before the stop nearest their destination in
//! the route's traversal order: nobody boards after the point they
//! want to alight. This is a hard binary filter applied before scoring,
//! never a scoring factor.

use crate::domain::{MatchRequest, Route};
use crate::geo::{self, Point};

use super::candidates::Candidate;
use super::config::MatchConfig;

/// Where a rider would board and alight a route, with the stop
/// distances that justified the choice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoardingPlan {
    /// Index of the boarding stop in the route's stop list.
    pub board_idx: usize,
    /// Index of the alighting stop.
    pub alight_idx: usize,
    /// Distance from the rider's origin to the boarding stop, meters.
    pub board_distance_m: f64,
    /// Distance from the rider's destination to the alighting stop, meters.
    pub alight_distance_m: f64,
}

/// The route stop nearest to `point`: (index, exact distance in meters).
/// Ties break toward the earlier stop.
pub fn nearest_stop(route: &Route, point: Point) -> Option<(usize, f64)> {
    route
        .stops
        .iter()
        .enumerate()
        .map(|(i, s)| (i, geo::distance_meters(point, s.location)))
        .min_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)))
}

/// Build a boarding plan, or reject the route for this rider.
///
/// Rejects when either endpoint has no stop within `stop_radius_m`, or
/// when the boarding stop does not strictly precede the alighting stop.
pub fn boarding_plan(
    route: &Route,
    origin: Point,
    destination: Point,
    stop_radius_m: f64,
) -> Option<BoardingPlan> {
    let (board_idx, board_distance_m) = nearest_stop(route, origin)?;
    if board_distance_m > stop_radius_m {
        return None;
    }

    let (alight_idx, alight_distance_m) = nearest_stop(route, destination)?;
    if alight_distance_m > stop_radius_m {
        return None;
    }

    if board_idx >= alight_idx {
        return None;
    }

    Some(BoardingPlan {
        board_idx,
        alight_idx,
        board_distance_m,
        alight_distance_m,
    })
}

/// A candidate that passed stop-sequence validation, with the derived
/// segment economics the later stages need.
#[derive(Debug, Clone)]
pub struct ValidatedCandidate {
    pub candidate: Candidate,
    pub plan: BoardingPlan,
    /// Price for the rider's segment of the route.
    pub price: f64,
    /// On-route minutes between boarding and alighting.
    pub ride_minutes: u32,
    /// Minutes the segment takes over a straight-line estimate at the
    /// configured average speed. Zero when the route is as fast.
    pub detour_min: u32,
}

/// Apply the hard boardability filter to one candidate.
pub fn validate_candidate(
    candidate: Candidate,
    request: &MatchRequest,
    config: &MatchConfig,
) -> Option<ValidatedCandidate> {
    let plan = boarding_plan(
        &candidate.route,
        request.origin,
        request.destination,
        config.stop_radius_m,
    )?;

    let price = candidate.route.segment_price(plan.board_idx, plan.alight_idx);
    let ride_minutes = candidate.route.ride_minutes(plan.board_idx, plan.alight_idx);

    let direct_km = geo::distance_meters(request.origin, request.destination) / 1_000.0;
    let direct_min = direct_km / config.avg_speed_kmh * 60.0;
    let detour_min = (f64::from(ride_minutes) - direct_min).max(0.0).round() as u32;

    Some(ValidatedCandidate {
        candidate,
        plan,
        price,
        ride_minutes,
        detour_min,
    })
}
