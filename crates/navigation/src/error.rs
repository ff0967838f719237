//! Error types for route acquisition, location feeds and the navigator

use pulsepoint_api_client::ApiError;
use pulsepoint_core::ErrorCode;
use thiserror::Error;

/// Result type alias for navigation operations
pub type Result<T> = std::result::Result<T, NavigationError>;

/// Why a route source could not produce geometry
///
/// Never surfaced past [`crate::RouteProvider`], which degrades to the
/// straight line path instead.
#[derive(Error, Debug)]
pub enum RouteError {
    /// Network or service failure
    #[error("routing service unavailable: {0}")]
    Unavailable(String),

    /// The service answered but the geometry is unusable
    #[error("malformed route: {0}")]
    Malformed(String),
}

impl RouteError {
    /// Workspace error code for this error
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Unavailable(_) => ErrorCode::RoutingUnavailable,
            Self::Malformed(_) => ErrorCode::MalformedRoute,
        }
    }
}

impl From<ApiError> for RouteError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::MalformedRoute(msg) => Self::Malformed(msg),
            ApiError::Json(e) => Self::Malformed(e.to_string()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

/// Why a location source could not produce a fix
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    /// Temporary failure, the source may recover
    #[error("location unavailable: {0}")]
    Unavailable(String),

    /// Permission refused or hardware missing; the source will not recover
    #[error("location access denied: {0}")]
    Denied(String),
}

impl LocationError {
    /// Workspace error code for this error
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        ErrorCode::LocationUnavailable
    }

    /// Whether polling the source again can succeed
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

/// Errors returned by the navigator handle
#[derive(Error, Debug)]
pub enum NavigationError {
    /// The navigator task has shut down
    #[error("navigator is no longer running")]
    SessionClosed,

    /// No facility matched a name query
    #[error("no facility matches '{0}'")]
    TargetNotFound(String),

    /// A fix or facility coordinate was out of range
    #[error(transparent)]
    Geo(#[from] pulsepoint_geo::GeoError),
}

impl NavigationError {
    /// Workspace error code for this error
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SessionClosed => ErrorCode::SessionClosed,
            Self::TargetNotFound(_) => ErrorCode::TargetNotFound,
            Self::Geo(e) => e.code(),
        }
    }
}

impl From<NavigationError> for pulsepoint_core::Error {
    fn from(err: NavigationError) -> Self {
        match &err {
            NavigationError::TargetNotFound(query) => Self::target_not_found(query),
            _ => Self::new(err.code(), err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_errors_map_to_route_errors() {
        let err: RouteError = ApiError::malformed_route("no geometry").into();
        assert!(matches!(err, RouteError::Malformed(_)));
        assert_eq!(err.code(), ErrorCode::MalformedRoute);

        let err: RouteError = ApiError::CircuitOpen.into();
        assert!(matches!(err, RouteError::Unavailable(_)));
        assert_eq!(err.code(), ErrorCode::RoutingUnavailable);
    }

    #[test]
    fn test_location_error_transience() {
        assert!(LocationError::Unavailable("no signal".into()).is_transient());
        assert!(!LocationError::Denied("permission".into()).is_transient());
    }

    #[test]
    fn test_navigation_error_codes() {
        assert_eq!(NavigationError::SessionClosed.code(), ErrorCode::SessionClosed);
        let core: pulsepoint_core::Error = NavigationError::TargetNotFound("dental".into()).into();
        assert_eq!(core.code, ErrorCode::TargetNotFound);
    }
}
