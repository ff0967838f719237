//! Core utilities for the PulsePoint engine
//!
//! This crate provides shared functionality used by every other crate in the
//! workspace:
//!
//! - **Error handling**: Coded errors with context and recovery suggestions
//! - **Configuration**: TOML-based configuration with serde defaults
//! - **Retry**: Exponential backoff and a circuit breaker for remote services
//!
//! # Example
//!
//! ```rust,no_run
//! use pulsepoint_core::config::Config;
//!
//! let config = Config::load(None).expect("config");
//! println!("arrival threshold: {} km", config.schema.navigation.arrival_threshold_km);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod retry;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::retry::{CircuitBreaker, CircuitBreakerConfig, CircuitState, RetryConfig};
}
