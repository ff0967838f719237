//! HTTP client for the PulsePoint facility backend and routing service
//!
//! # Features
//!
//! - **Environment-based configuration**: Load URLs and timeouts from environment variables
//! - **Retry with exponential backoff**: Automatic retry for transient failures
//! - **Circuit breaker**: One breaker per remote service
//! - **Request correlation**: Track requests with unique IDs for debugging
//! - **Boundary validation**: Facility records with impossible coordinates never reach the engine
//!
//! # Example
//!
//! ```rust,no_run
//! use pulsepoint_api_client::PulsePointClient;
//! use pulsepoint_geo::Coordinate;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PulsePointClient::new()?;
//!
//!     let facilities = client.facilities().list().await?;
//!     println!("{} facilities", facilities.len());
//!
//!     let route = client
//!         .routing()
//!         .route(&Coordinate::new(9.9252, 78.1198), &Coordinate::new(9.9300, 78.1250))
//!         .await?;
//!     println!("{} points", route.coordinates.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;

pub use client::{PulsePointClient, Service};
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, ApiResult};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::client::{PulsePointClient, Service};
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::endpoints::{FacilitiesApi, RouteGeometry, RoutingApi};
    pub use crate::error::{ApiError, ApiResult};
}
