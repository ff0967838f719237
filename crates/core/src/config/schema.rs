//! Configuration schema definitions
//!
//! Every field has a serde default, so an empty file (or no file at all)
//! yields the same values the engine ships with.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    /// Navigation session policy
    #[serde(default)]
    pub navigation: NavigationConfig,

    /// Location feed settings
    #[serde(default)]
    pub location: LocationConfig,

    /// Proximity search settings
    #[serde(default)]
    pub search: SearchConfig,

    /// Routing service settings
    #[serde(default)]
    pub routing: RoutingConfig,

    /// Facility backend settings
    #[serde(default)]
    pub backend: BackendConfig,
}

impl ConfigSchema {
    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if !(self.navigation.arrival_threshold_km > 0.0) {
            return Err(Error::invalid_config_value(
                "navigation.arrival_threshold_km",
                "must be greater than zero",
            ));
        }

        let (lat, lng) = (self.location.default_latitude, self.location.default_longitude);
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(Error::invalid_coordinate(lat, lng).with_context("location.default_*"));
        }

        if !(self.search.default_radius_km >= 0.0) {
            return Err(Error::invalid_config_value(
                "search.default_radius_km",
                "must not be negative",
            ));
        }

        if self.location.fix_interval_ms == 0 {
            return Err(Error::invalid_config_value(
                "location.fix_interval_ms",
                "must be greater than zero",
            ));
        }

        Ok(())
    }
}

/// Navigation session policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// Distance below which the target counts as reached
    #[serde(default = "default_arrival_threshold_km")]
    pub arrival_threshold_km: f64,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            arrival_threshold_km: default_arrival_threshold_km(),
        }
    }
}

fn default_arrival_threshold_km() -> f64 {
    0.05
}

/// Location feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Latitude used when no fix can be acquired
    #[serde(default = "default_latitude")]
    pub default_latitude: f64,

    /// Longitude used when no fix can be acquired
    #[serde(default = "default_longitude")]
    pub default_longitude: f64,

    /// Interval between simulated or scripted fixes
    #[serde(default = "default_fix_interval_ms")]
    pub fix_interval_ms: u64,

    /// Delay before polling a failed source again
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            default_latitude: default_latitude(),
            default_longitude: default_longitude(),
            fix_interval_ms: default_fix_interval_ms(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

// Madurai city centre
fn default_latitude() -> f64 {
    9.9252
}

fn default_longitude() -> f64 {
    78.1198
}

fn default_fix_interval_ms() -> u64 {
    1000
}

fn default_retry_interval_ms() -> u64 {
    5000
}

/// Proximity search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Radius used by `nearby` when none is given
    #[serde(default = "default_radius_km")]
    pub default_radius_km: f64,

    /// Radius used for the "facilities close by" count
    #[serde(default = "default_close_by_radius_km")]
    pub close_by_radius_km: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_radius_km: default_radius_km(),
            close_by_radius_km: default_close_by_radius_km(),
        }
    }
}

fn default_radius_km() -> f64 {
    10.0
}

fn default_close_by_radius_km() -> f64 {
    5.0
}

/// Routing service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// OSRM compatible base URL
    #[serde(default = "default_routing_url")]
    pub base_url: String,

    /// OSRM profile (driving, walking, cycling)
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Per request timeout in seconds
    #[serde(default = "default_routing_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: default_routing_url(),
            profile: default_profile(),
            timeout_secs: default_routing_timeout_secs(),
        }
    }
}

fn default_routing_url() -> String {
    "https://router.project-osrm.org".to_string()
}

fn default_profile() -> String {
    "driving".to_string()
}

fn default_routing_timeout_secs() -> u64 {
    10
}

/// Facility backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the facility REST API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Per request timeout in seconds
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout_secs: default_backend_timeout_secs(),
        }
    }
}

fn default_api_url() -> String {
    "https://backend-pulsepoint.onrender.com/api".to_string()
}

fn default_backend_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let schema = ConfigSchema::default();
        assert!((schema.navigation.arrival_threshold_km - 0.05).abs() < f64::EPSILON);
        assert!((schema.location.default_latitude - 9.9252).abs() < f64::EPSILON);
        assert_eq!(schema.routing.profile, "driving");
        assert!(schema.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let schema: ConfigSchema = toml::from_str(
            r#"
            [navigation]
            arrival_threshold_km = 0.1

            [routing]
            profile = "walking"
            "#,
        )
        .unwrap();

        assert!((schema.navigation.arrival_threshold_km - 0.1).abs() < f64::EPSILON);
        assert_eq!(schema.routing.profile, "walking");
        assert_eq!(schema.routing.base_url, "https://router.project-osrm.org");
        assert!((schema.search.default_radius_km - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let mut schema = ConfigSchema::default();
        schema.navigation.arrival_threshold_km = 0.0;
        assert!(schema.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_default_location() {
        let mut schema = ConfigSchema::default();
        schema.location.default_latitude = 120.0;
        assert!(schema.validate().is_err());
    }
}
