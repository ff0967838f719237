//! Error types for the API client

use pulsepoint_core::ErrorCode;
use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Service returned an error response
    #[error("API error ({status}): {message}")]
    ApiResponse {
        /// HTTP status code
        status: u16,
        /// Error message from the service
        message: String,
    },

    /// Routing service answered, but without a usable geometry
    #[error("Malformed route response: {0}")]
    MalformedRoute(String),

    /// Circuit breaker is open
    #[error("Circuit breaker is open - service temporarily unavailable")]
    CircuitOpen,

    /// All retry attempts exhausted
    #[error("All {attempts} retry attempts failed: {last_error}")]
    RetriesExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Last error message
        last_error: String,
    },
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an API response error
    pub fn api_response(status: u16, message: impl Into<String>) -> Self {
        Self::ApiResponse {
            status,
            message: message.into(),
        }
    }

    /// Create a malformed route error
    pub fn malformed_route(message: impl Into<String>) -> Self {
        Self::MalformedRoute(message.into())
    }

    /// Check if this error is retryable
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            // Retry on connection errors, timeouts
            Self::Request(e) => e.is_connect() || e.is_timeout(),
            // Retry on 5xx errors and 429 (rate limited)
            Self::ApiResponse { status, .. } => *status >= 500 || *status == 429,
            Self::CircuitOpen
            | Self::Config(_)
            | Self::Json(_)
            | Self::MalformedRoute(_)
            | Self::RetriesExhausted { .. } => false,
        }
    }

    /// Check if this is a client error (4xx)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiResponse { status, .. } if (400..500).contains(status))
    }

    /// Workspace error code for this error
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Request(e) if e.is_timeout() => ErrorCode::Timeout,
            Self::Request(_) | Self::CircuitOpen | Self::RetriesExhausted { .. } => {
                ErrorCode::RoutingUnavailable
            }
            Self::ApiResponse { .. } => ErrorCode::ServiceError,
            Self::Json(_) | Self::MalformedRoute(_) => ErrorCode::MalformedRoute,
            Self::Config(_) => ErrorCode::ConfigError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        assert!(ApiError::api_response(503, "down").is_retryable());
        assert!(ApiError::api_response(429, "slow down").is_retryable());
        assert!(!ApiError::api_response(400, "bad coordinates").is_retryable());
        assert!(!ApiError::malformed_route("no geometry").is_retryable());
        assert!(!ApiError::CircuitOpen.is_retryable());
    }

    #[test]
    fn test_client_error() {
        assert!(ApiError::api_response(404, "missing").is_client_error());
        assert!(!ApiError::api_response(500, "boom").is_client_error());
    }

    #[test]
    fn test_codes() {
        assert_eq!(ApiError::CircuitOpen.code(), ErrorCode::RoutingUnavailable);
        assert_eq!(ApiError::malformed_route("x").code(), ErrorCode::MalformedRoute);
        assert_eq!(ApiError::config("x").code(), ErrorCode::ConfigError);
    }
}
