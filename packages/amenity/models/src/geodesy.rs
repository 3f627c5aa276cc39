//! WGS84 coordinates and great-circle distance.

use serde::{Deserialize, Serialize};

/// Earth radius used for every distance in the system, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A resolved `(latitude, longitude)` pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude (WGS84).
    pub latitude: f64,
    /// Longitude (WGS84).
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both components are finite and inside the WGS84 ranges.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

/// Haversine distance between two coordinates in meters.
///
/// NaN or infinite inputs propagate into the result instead of erroring.
#[must_use]
pub fn haversine(a: Coordinate, b: Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);

    // `f64::min` would swallow a NaN here.
    let s = h.sqrt();
    let s = if s > 1.0 { 1.0 } else { s };

    2.0 * EARTH_RADIUS_M * s.asin()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CITY_HALL: Coordinate = Coordinate::new(24.1477, 120.6736);
    const TAIPEI_101: Coordinate = Coordinate::new(25.0340, 121.5645);

    #[test]
    fn identity_is_zero() {
        assert!(haversine(CITY_HALL, CITY_HALL).abs() < f64::EPSILON);
    }

    #[test]
    fn symmetric() {
        let ab = haversine(CITY_HALL, TAIPEI_101);
        let ba = haversine(TAIPEI_101, CITY_HALL);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn taichung_to_taipei_is_about_131_km() {
        let d = haversine(CITY_HALL, TAIPEI_101);
        assert!((125_000.0..135_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = haversine(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        let expected = EARTH_RADIUS_M * 1.0_f64.to_radians();
        assert!((d - expected).abs() < 1e-6);
    }

    #[test]
    fn nan_propagates() {
        let d = haversine(Coordinate::new(f64::NAN, 0.0), CITY_HALL);
        assert!(d.is_nan(), "got {d}");
        let d = haversine(CITY_HALL, Coordinate::new(0.0, f64::NAN));
        assert!(d.is_nan(), "got {d}");
    }

    #[test]
    fn infinite_input_is_not_finite() {
        let d = haversine(Coordinate::new(f64::INFINITY, 0.0), CITY_HALL);
        assert!(!d.is_finite(), "got {d}");
        let d = haversine(CITY_HALL, Coordinate::new(0.0, f64::NEG_INFINITY));
        assert!(!d.is_finite(), "got {d}");
    }

    #[test]
    fn antipodes_stay_finite() {
        let d = haversine(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 180.0));
        assert!((d - EARTH_RADIUS_M * std::f64::consts::PI).abs() < 1e-3);
    }

    #[test]
    fn validity() {
        assert!(CITY_HALL.is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
        assert!(!Coordinate::new(f64::INFINITY, 0.0).is_valid());
    }
}
