//! Geospatial primitives for PulsePoint.
//!
//! This crate provides:
//! - Haversine distance, initial bearing and destination point math
//! - The facility data model
//! - Distance-annotated, sorted facility views with radius and name filters
//! - Batch annotation with optional parallelism
//!
//! # Example
//!
//! ```
//! use pulsepoint_geo::{distance_km, Coordinate};
//!
//! let observer = Coordinate::new(9.9252, 78.1198);
//! let hospital = Coordinate::new(9.9300, 78.1250);
//!
//! let distance = distance_km(&observer, &hospital);
//! assert!((distance - 0.78).abs() < 0.05);
//! ```

mod error;
mod facility;
mod haversine;
pub mod index;

pub use error::{GeoError, Result};
pub use facility::{AnnotatedFacility, Facility, FacilityId};
pub use haversine::{
    destination_point, distance_km, distance_m, initial_bearing, path_length_km,
    EARTH_RADIUS_KM, EARTH_RADIUS_M,
};
pub use index::{
    annotate, count_within, filter_by_radius, find_by_name_substring, FacilityIndex,
};

use std::fmt;

/// A geographic coordinate with latitude and longitude.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate without range checks.
    ///
    /// # Arguments
    /// * `latitude` - Latitude in degrees (-90 to 90)
    /// * `longitude` - Longitude in degrees (-180 to 180)
    #[inline]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Creates a coordinate, rejecting out-of-range or non-finite values.
    pub fn validated(latitude: f64, longitude: f64) -> Result<Self> {
        let coord = Self::new(latitude, longitude);
        if coord.is_valid() {
            Ok(coord)
        } else {
            Err(GeoError::InvalidCoordinate { latitude, longitude })
        }
    }

    /// Returns true if the coordinate has valid values.
    #[inline]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Converts degrees to radians for internal calculations.
    #[inline]
    pub(crate) fn to_radians(self) -> (f64, f64) {
        (self.latitude.to_radians(), self.longitude.to_radians())
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((lat, lng): (f64, f64)) -> Self {
        Self::new(lat, lng)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_creation() {
        let coord = Coordinate::new(9.9252, 78.1198);
        assert_eq!(coord.latitude, 9.9252);
        assert_eq!(coord.longitude, 78.1198);
    }

    #[test]
    fn test_coordinate_validation() {
        assert!(Coordinate::new(0.0, 0.0).is_valid());
        assert!(Coordinate::new(90.0, 180.0).is_valid());
        assert!(Coordinate::new(-90.0, -180.0).is_valid());
        assert!(!Coordinate::new(91.0, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, 181.0).is_valid());
        assert!(!Coordinate::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_validated_rejects_out_of_range() {
        assert!(Coordinate::validated(9.9252, 78.1198).is_ok());

        let err = Coordinate::validated(-95.0, 10.0).unwrap_err();
        assert_eq!(err.code(), pulsepoint_core::ErrorCode::InvalidCoordinate);
    }

    #[test]
    fn test_coordinate_from_tuple() {
        let coord: Coordinate = (9.9252, 78.1198).into();
        assert_eq!(coord.latitude, 9.9252);
    }

    #[test]
    fn test_display() {
        assert_eq!(Coordinate::new(9.9252, 78.1198).to_string(), "(9.92520, 78.11980)");
    }
}
