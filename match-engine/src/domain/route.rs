//! Driver route model.
//!
//! Routes are owned and mutated by the platform's route-management
//! service; the engine reads them (directly or via cache) and never
//! writes back. Because they cross a service boundary, invariants are
//! re-checked with [`Route::validate`] wherever routes enter the engine,
//! and invalid ones are dropped rather than propagated.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::geo::Point;

use super::error::DomainError;
use super::{DriverId, HubId, RouteId, VehicleId};

/// Lifecycle status of a route. Only `Active` routes are match candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RouteStatus {
    Active,
    Paused,
    Cancelled,
}

/// Set of weekdays a route runs on, stored as a bitmask.
///
/// Bit 0 is Monday through bit 6 Sunday, matching
/// `Weekday::num_days_from_monday`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Monday through Friday.
    pub fn weekdays() -> Self {
        Self::from_days(&[
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
        ])
    }

    /// All seven days.
    pub fn every_day() -> Self {
        Self(0b0111_1111)
    }

    pub fn from_days(days: &[Weekday]) -> Self {
        let mut set = Self::empty();
        for day in days {
            set.insert(*day);
        }
        set
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// One stop on a route's traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStop {
    /// Position in the traversal order, contiguous from 0.
    pub sequence: u32,
    pub name: String,
    pub location: Point,
    /// Minutes after the route's departure time that the driver reaches
    /// this stop.
    pub arrival_offset_min: u32,
    /// Cumulative price from the route origin to this stop.
    pub price_from_origin: f64,
}

/// A driver's published route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    pub driver: DriverId,
    pub vehicle: VehicleId,
    /// Ordered stops; sequence indices are contiguous and strictly
    /// increasing.
    pub stops: Vec<RouteStop>,
    /// Time of day the route departs its first stop.
    pub departure_time: NaiveTime,
    pub weekdays: WeekdaySet,
    pub seats_total: u8,
    pub seats_available: u8,
    pub base_price: f64,
    /// ISO 4217 currency code for all prices on this route.
    pub currency: String,
    pub status: RouteStatus,
    /// Hub associations, absent on routes not yet migrated to hub-based
    /// modelling (those match via the geometry fallback).
    pub origin_hub: Option<HubId>,
    pub destination_hub: Option<HubId>,
}

impl Route {
    /// Check the route's structural invariants.
    ///
    /// Routes come from an external store, so the engine treats these as
    /// data-quality checks rather than panics.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.stops.len() < 2 {
            return Err(self.invalid("fewer than two stops"));
        }
        for (i, stop) in self.stops.iter().enumerate() {
            if stop.sequence as usize != i {
                return Err(self.invalid("stop sequence not contiguous from 0"));
            }
            if !stop.price_from_origin.is_finite() || stop.price_from_origin < 0.0 {
                return Err(self.invalid("negative or non-finite stop price"));
            }
        }
        for pair in self.stops.windows(2) {
            if pair[1].arrival_offset_min < pair[0].arrival_offset_min {
                return Err(self.invalid("arrival offsets decrease along the route"));
            }
            if pair[1].price_from_origin < pair[0].price_from_origin {
                return Err(self.invalid("cumulative prices decrease along the route"));
            }
        }
        if self.seats_available > self.seats_total {
            return Err(self.invalid("available seats exceed total seats"));
        }
        if !self.base_price.is_finite() || self.base_price < 0.0 {
            return Err(self.invalid("negative or non-finite base price"));
        }
        if self.currency.is_empty() {
            return Err(self.invalid("missing currency"));
        }
        if self.weekdays.is_empty() {
            return Err(self.invalid("empty weekday set"));
        }
        Ok(())
    }

    fn invalid(&self, reason: &'static str) -> DomainError {
        DomainError::InvalidRoute {
            route: self.id.clone(),
            reason,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RouteStatus::Active
    }

    pub fn runs_on(&self, day: Weekday) -> bool {
        self.weekdays.contains(day)
    }

    /// Ride duration in minutes between two stop indices.
    ///
    /// Callers guarantee `board < alight < stops.len()` (the boarding
    /// plan is validated before this is used).
    pub fn ride_minutes(&self, board: usize, alight: usize) -> u32 {
        self.stops[alight].arrival_offset_min - self.stops[board].arrival_offset_min
    }

    /// Price for the segment between two stop indices: the cumulative
    /// price difference, falling back to the base price when the route's
    /// per-stop prices are not populated.
    pub fn segment_price(&self, board: usize, alight: usize) -> f64 {
        let diff = self.stops[alight].price_from_origin - self.stops[board].price_from_origin;
        if diff > 0.0 { diff } else { self.base_price }
    }
}
