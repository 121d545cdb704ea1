//! Transportation hub model.

use serde::{Deserialize, Serialize};

use crate::geo::Point;

use super::HubId;

/// A fixed geographic aggregation point for route origins/destinations.
///
/// Hubs are created and deactivated by the platform's administrative
/// service; this engine only reads them. Only active hubs take part in
/// resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hub {
    pub id: HubId,
    pub name: String,
    pub location: Point,
    /// Administrative area tag, e.g. an LGA or district name.
    pub area: String,
    pub active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let hub = Hub {
            id: HubId::parse("hub-ikeja").unwrap(),
            name: "Ikeja City Mall".to_string(),
            location: Point::new(6.6018, 3.3515).unwrap(),
            area: "Ikeja".to_string(),
            active: true,
        };

        let json = serde_json::to_string(&hub).unwrap();
        let back: Hub = serde_json::from_str(&json).unwrap();
        assert_eq!(hub, back);
    }
}
