//! Domain types for the route-matching engine.
//!
//! These types represent validated platform data. Identifiers and
//! coordinates enforce their invariants at construction time; routes,
//! which cross a service boundary, carry an explicit `validate` check
//! applied wherever they enter the engine.

mod error;
mod hub;
mod ids;
mod request;
mod route;

pub use error::DomainError;
pub use hub::Hub;
pub use ids::{DriverId, HubId, InvalidId, RiderId, RouteId, VehicleId};
pub use request::{MatchFilters, MatchRequest};
pub use route::{Route, RouteStatus, RouteStop, WeekdaySet};
