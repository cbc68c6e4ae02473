// 🧭 Geo - point type and distance in meters
//
// Two coordinate systems:
// - Geographic: WGS84 lat/lng in degrees, haversine great-circle distance
// - Projected:  planar meters (lat = northing, lng = easting), Euclidean distance
//
// The 1740 register exports are in UTM 33N, so Projected runs directly on them.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        GeoPoint { lat, lng }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSystem {
    /// Degrees on the WGS84 ellipsoid, measured on a sphere
    #[default]
    Geographic,

    /// Already-projected planar coordinates in meters
    Projected,
}

impl CoordinateSystem {
    /// Distance between two points in meters.
    pub fn distance_m(&self, a: GeoPoint, b: GeoPoint) -> f64 {
        match self {
            CoordinateSystem::Geographic => haversine_m(a, b),
            CoordinateSystem::Projected => planar_m(a, b),
        }
    }
}

/// Great-circle distance in meters.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    // clamp: rounding can push h a hair above 1 for antipodal points
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

pub fn planar_m(a: GeoPoint, b: GeoPoint) -> f64 {
    (b.lat - a.lat).hypot(b.lng - a.lng)
}

// ============================================================================
// TESTS
// ============================================================================
