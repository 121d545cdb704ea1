//! Identifier newtypes for platform entities.
//!
//! Ids are opaque strings assigned by the surrounding platform. Validation
//! is intentionally loose: non-empty, bounded length, ASCII alphanumeric
//! plus `-` and `_`, so UUIDs and human-readable slugs both pass.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Maximum accepted identifier length.
const MAX_ID_LEN: usize = 64;

/// Error returned when parsing an invalid entity id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} id: {reason}")]
pub struct InvalidId {
    kind: &'static str,
    reason: &'static str,
}

fn check_id(kind: &'static str, s: &str) -> Result<(), InvalidId> {
    if s.is_empty() {
        return Err(InvalidId {
            kind,
            reason: "cannot be empty",
        });
    }
    if s.len() > MAX_ID_LEN {
        return Err(InvalidId {
            kind,
            reason: "too long",
        });
    }
    if !s
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    {
        return Err(InvalidId {
            kind,
            reason: "must be ASCII alphanumeric, '-' or '_'",
        });
    }
    Ok(())
}

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident, $kind:literal) => {
        $(#[$doc])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an id, validating the character set and length.
            pub fn parse(s: impl Into<String>) -> Result<Self, InvalidId> {
                let s = s.into();
                check_id($kind, &s)?;
                Ok(Self(s))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidId;

            fn try_from(s: String) -> Result<Self, InvalidId> {
                Self::parse(s)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of a transportation hub.
    HubId,
    "hub"
);
entity_id!(
    /// Identifier of a driver route.
    RouteId,
    "route"
);
entity_id!(
    /// Identifier of a driver.
    DriverId,
    "driver"
);
entity_id!(
    /// Identifier of a rider.
    RiderId,
    "rider"
);
entity_id!(
    /// Identifier of a vehicle.
    VehicleId,
    "vehicle"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_ids() {
        assert!(HubId::parse("hub-001").is_ok());
        assert!(RouteId::parse("3f2a9c1e").is_ok());
        assert!(DriverId::parse("driver_42").is_ok());
        assert!(RiderId::parse("A").is_ok());
    }

    #[test]
    fn reject_empty() {
        assert!(HubId::parse("").is_err());
    }

    #[test]
    fn reject_bad_characters() {
        assert!(HubId::parse("hub 1").is_err());
        assert!(HubId::parse("hub/1").is_err());
        assert!(HubId::parse("hüb").is_err());
    }

    #[test]
    fn reject_too_long() {
        let long = "a".repeat(65);
        assert!(RouteId::parse(long).is_err());
    }

    #[test]
    fn display_and_debug() {
        let id = HubId::parse("hub-001").unwrap();
        assert_eq!(format!("{id}"), "hub-001");
        assert_eq!(format!("{id:?}"), "HubId(hub-001)");
    }

    #[test]
    fn ordering_is_lexicographic() {
        let a = HubId::parse("hub-001").unwrap();
        let b = HubId::parse("hub-002").unwrap();
        assert!(a < b);
    }

    #[test]
    fn serde_roundtrip_validates() {
        let id = DriverId::parse("driver_42").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"driver_42\"");
        let back: DriverId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);

        let bad: Result<DriverId, _> = serde_json::from_str("\"not valid!\"");
        assert!(bad.is_err());
    }
}
