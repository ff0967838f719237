//! Error types for the geo crate.

use pulsepoint_core::ErrorCode;
use thiserror::Error;

/// Result type alias for geo operations.
pub type Result<T> = std::result::Result<T, GeoError>;

/// Errors that can occur during geo operations.
///
/// Distance and bearing math never fails; only coordinates entering the
/// crate through [`crate::Coordinate::validated`] are checked.
#[derive(Debug, Error)]
pub enum GeoError {
    /// Latitude or longitude outside the valid range, or not finite
    #[error("Invalid coordinate: ({latitude}, {longitude})")]
    InvalidCoordinate {
        /// Rejected latitude
        latitude: f64,
        /// Rejected longitude
        longitude: f64,
    },
}

impl GeoError {
    /// Returns the workspace error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            GeoError::InvalidCoordinate { .. } => ErrorCode::InvalidCoordinate,
        }
    }
}

impl From<GeoError> for pulsepoint_core::Error {
    fn from(err: GeoError) -> Self {
        match err {
            GeoError::InvalidCoordinate { latitude, longitude } => {
                pulsepoint_core::Error::invalid_coordinate(latitude, longitude)
            }
        }
    }
}
