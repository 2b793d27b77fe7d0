//! Location types for orders and profiles.
//!
//! An order carries exactly one of two location shapes depending on the
//! service kind: a from/to route (transfers) or a single general area
//! (accompaniment). The shapes are mutually exclusive by construction.

use serde::{Deserialize, Serialize};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A human-entered address, optionally resolved to coordinates by the
/// geocoding collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Free-form address text as entered.
    pub address: String,
    /// Resolved coordinates, if geocoding succeeded.
    #[serde(default)]
    pub point: Option<GeoPoint>,
}

impl Location {
    /// Create a location from an address without coordinates.
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            point: None,
        }
    }
}

/// The two mutually-exclusive location shapes an order can carry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "shape")]
pub enum OrderLocation {
    /// Pick-up and drop-off pair (transfer services).
    Route { from: Location, to: Location },
    /// Single general area (accompaniment services).
    Area { general: Location },
}

impl OrderLocation {
    /// Whether this is the from/to route shape.
    pub fn is_route(&self) -> bool {
        matches!(self, Self::Route { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shapes_exclusive() {
        let route = OrderLocation::Route {
            from: Location::from_address("1 Main St"),
            to: Location::from_address("2 Elm St"),
        };
        let area = OrderLocation::Area {
            general: Location::from_address("Downtown"),
        };
        assert!(route.is_route());
        assert!(!area.is_route());
    }

    #[test]
    fn test_location_serde_shape_tag() {
        let area = OrderLocation::Area {
            general: Location::from_address("Downtown"),
        };
        let json = serde_json::to_string(&area).unwrap();
        assert!(json.contains("\"shape\":\"area\""));
    }
}
