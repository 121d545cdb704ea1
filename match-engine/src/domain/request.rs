//! Match request types.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::geo::{self, Point};

use super::RiderId;
use super::error::DomainError;

/// Optional hard constraints a rider can attach to a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchFilters {
    /// Reject candidates priced above this.
    pub max_price: Option<f64>,
    /// Reject candidates with fewer available seats.
    pub min_seats: Option<u8>,
    /// Reject candidates whose ride detours more than this many minutes
    /// over a direct trip.
    pub max_detour_min: Option<u32>,
}

impl MatchFilters {
    fn validate(&self) -> Result<(), DomainError> {
        if let Some(p) = self.max_price {
            if !p.is_finite() || p < 0.0 {
                return Err(DomainError::InvalidRequest(
                    "max_price must be non-negative and finite",
                ));
            }
        }
        Ok(())
    }
}

/// One rider's request for compatible routes. Ephemeral, one per call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub rider: RiderId,
    pub origin: Point,
    pub destination: Point,
    /// When the rider wants to depart, in the platform's local time.
    pub departure: NaiveDateTime,
    #[serde(default)]
    pub filters: MatchFilters,
    /// Requested number of results; clamped to the configured cap.
    pub limit: Option<usize>,
}

impl MatchRequest {
    /// Validate the request. Called before any store access; a failure
    /// here means no upstream query is ever attempted.
    pub fn validate(&self) -> Result<(), DomainError> {
        // Points are validated at construction; what remains is the
        // relationship between the two.
        if geo::distance_meters(self.origin, self.destination) < 1.0 {
            return Err(DomainError::InvalidRequest(
                "origin and destination are the same point",
            ));
        }
        if self.limit == Some(0) {
            return Err(DomainError::InvalidRequest("limit must be positive"));
        }
        self.filters.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn request() -> MatchRequest {
        MatchRequest {
            rider: RiderId::parse("rider-1").unwrap(),
            origin: Point::new(6.5244, 3.3792).unwrap(),
            destination: Point::new(6.4281, 3.4219).unwrap(),
            departure: NaiveDate::from_ymd_opt(2026, 3, 2)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap(),
            filters: MatchFilters::default(),
            limit: None,
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn reject_identical_endpoints() {
        let mut r = request();
        r.destination = r.origin;
        assert!(r.validate().is_err());
    }

    #[test]
    fn reject_zero_limit() {
        let mut r = request();
        r.limit = Some(0);
        assert!(r.validate().is_err());
    }

    #[test]
    fn reject_negative_max_price() {
        let mut r = request();
        r.filters.max_price = Some(-1.0);
        assert!(r.validate().is_err());
    }
}
