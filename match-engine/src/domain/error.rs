//! Domain error types.
//!
//! Validation failures and data inconsistencies in the domain layer,
//! distinct from store/IO errors.

use super::RouteId;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    /// A route from the external store violates a structural invariant.
    #[error("invalid route {route}: {reason}")]
    InvalidRoute { route: RouteId, reason: &'static str },

    /// A match request failed validation before any store access.
    #[error("invalid match request: {0}")]
    InvalidRequest(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidRoute {
            route: RouteId::parse("r1").unwrap(),
            reason: "fewer than two stops",
        };
        assert_eq!(err.to_string(), "invalid route r1: fewer than two stops");

        let err = DomainError::InvalidRequest("origin equals destination");
        assert_eq!(
            err.to_string(),
            "invalid match request: origin equals destination"
        );
    }
}
