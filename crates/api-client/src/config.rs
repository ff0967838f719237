//! Configuration for the PulsePoint API client
//!
//! Supports environment-based configuration, TOML configuration through
//! [`pulsepoint_core::config::ConfigSchema`], and sensible defaults.

use crate::error::{ApiError, ApiResult};
use pulsepoint_core::config::ConfigSchema;
use pulsepoint_core::retry::RetryConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default production facility backend
const DEFAULT_API_URL: &str = "https://backend-pulsepoint.onrender.com/api";

/// Public OSRM demo server
const DEFAULT_ROUTING_URL: &str = "https://router.project-osrm.org";

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development (backend on localhost:5000)
    Development,
    /// Production environment
    #[default]
    Production,
}

impl Environment {
    /// Parse from the `PULSEPOINT_ENV` environment variable
    pub fn from_env() -> Self {
        match env::var("PULSEPOINT_ENV")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "development" | "dev" | "local" => Self::Development,
            _ => Self::Production,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the facility REST API
    pub api_url: String,
    /// Base URL of the OSRM compatible routing service
    pub routing_url: String,
    /// OSRM profile (driving, walking, cycling)
    pub routing_profile: String,
    /// Backend request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Routing request timeout
    #[serde(with = "duration_secs")]
    pub routing_timeout: Duration,
    /// Retry configuration for backend requests
    pub retry: RetryConfig,
    /// Retry configuration for routing requests
    pub routing_retry: RetryConfig,
    /// Current environment
    pub environment: Environment,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            routing_url: DEFAULT_ROUTING_URL.to_string(),
            routing_profile: "driving".to_string(),
            timeout: Duration::from_secs(30),
            routing_timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
            routing_retry: RetryConfig::quick(),
            environment: Environment::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `PULSEPOINT_API_URL`: facility backend base URL
    /// - `PULSEPOINT_ROUTING_URL`: routing service base URL
    /// - `PULSEPOINT_ENV`: environment (development/production)
    /// - `PULSEPOINT_TIMEOUT_SECS`: backend request timeout in seconds
    pub fn from_env() -> ApiResult<Self> {
        let environment = Environment::from_env();
        let base = match environment {
            Environment::Development => Self::development(),
            Environment::Production => Self::default(),
        };
        let config = base.with_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from a loaded config file, then apply
    /// environment overrides on top.
    pub fn from_schema(schema: &ConfigSchema) -> ApiResult<Self> {
        let config = Self {
            api_url: schema.backend.api_url.clone(),
            routing_url: schema.routing.base_url.clone(),
            routing_profile: schema.routing.profile.clone(),
            timeout: Duration::from_secs(schema.backend.timeout_secs),
            routing_timeout: Duration::from_secs(schema.routing.timeout_secs),
            environment: Environment::from_env(),
            ..Self::default()
        }
        .with_env_overrides();

        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = env::var("PULSEPOINT_API_URL") {
            self.api_url = url;
        }
        if let Ok(url) = env::var("PULSEPOINT_ROUTING_URL") {
            self.routing_url = url;
        }
        if let Some(timeout) = env::var("PULSEPOINT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
        {
            self.timeout = timeout;
        }
        self
    }

    /// Create development configuration (local backend)
    #[must_use]
    pub fn development() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryConfig::quick(),
            environment: Environment::Development,
            ..Self::default()
        }
    }

    /// Builder-style method to set the backend URL
    #[must_use]
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Builder-style method to set the routing URL
    #[must_use]
    pub fn with_routing_url(mut self, url: impl Into<String>) -> Self {
        self.routing_url = url.into();
        self
    }

    /// Builder-style method to set the routing profile
    #[must_use]
    pub fn with_routing_profile(mut self, profile: impl Into<String>) -> Self {
        self.routing_profile = profile.into();
        self
    }

    /// Builder-style method to set the backend timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder-style method to set both retry configs
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.routing_retry = retry.clone();
        self.retry = retry;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        for (name, url) in [("api_url", &self.api_url), ("routing_url", &self.routing_url)] {
            if url.is_empty() {
                return Err(ApiError::config(format!("{name} cannot be empty")));
            }
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ApiError::config(format!(
                    "{name} must start with http:// or https://"
                )));
            }
        }

        if self.routing_profile.trim().is_empty() {
            return Err(ApiError::config("routing_profile cannot be empty"));
        }

        if self.timeout.is_zero() || self.routing_timeout.is_zero() {
            return Err(ApiError::config("timeouts cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert!(config.api_url.ends_with("/api"));
        assert!(config.routing_url.contains("osrm"));
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.routing_retry.max_attempts, 2);
    }

    #[test]
    fn test_development_config() {
        let config = ClientConfig::development();
        assert!(config.api_url.contains("localhost"));
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_from_schema() {
        let mut schema = ConfigSchema::default();
        schema.routing.profile = "walking".to_string();
        schema.routing.timeout_secs = 4;

        let config = ClientConfig::from_schema(&schema).unwrap();
        assert_eq!(config.routing_profile, "walking");
        assert_eq!(config.routing_timeout, Duration::from_secs(4));
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::default()
            .with_api_url("https://staging.example.com/api")
            .with_routing_url("http://localhost:5001")
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.api_url, "https://staging.example.com/api");
        assert_eq!(config.routing_url, "http://localhost:5001");
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::default().with_api_url("").validate().is_err());
        assert!(ClientConfig::default()
            .with_routing_url("ftp://router")
            .validate()
            .is_err());
        assert!(ClientConfig::default()
            .with_routing_profile(" ")
            .validate()
            .is_err());
    }
}
