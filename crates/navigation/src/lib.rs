//! Navigation engine for PulsePoint.
//!
//! This crate provides:
//! - [`RouteProvider`]: route acquisition that degrades to a straight line
//! - [`NavigationSession`]: the Idle / Routing / Active / Arrived state machine
//! - [`LocationFeed`]: a background task publishing location fixes
//! - [`Navigator`]: the runtime tying the three together behind a handle
//!
//! # Example
//!
//! ```rust,no_run
//! use pulsepoint_api_client::PulsePointClient;
//! use pulsepoint_geo::Coordinate;
//! use pulsepoint_navigation::{
//!     LocationFeed, Navigator, NavigatorConfig, RouteProvider, SimulatedWalk,
//! };
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = PulsePointClient::new()?;
//!     let facilities = client.facilities().list().await?;
//!
//!     let start = Coordinate::new(9.9252, 78.1198);
//!     let walk = SimulatedWalk::new(start, Coordinate::new(9.93, 78.125), 5.0, Duration::from_secs(1));
//!     let feed = LocationFeed::spawn(walk, start);
//!
//!     let navigator = Navigator::spawn(
//!         NavigatorConfig::default(),
//!         facilities,
//!         RouteProvider::new(client.routing()),
//!         feed.fixes(),
//!     );
//!
//!     navigator.select_by_name("apollo").await?;
//!     let arrived = navigator.wait_for(|s| s.arrivals > 0).await?;
//!     println!("arrived at {}", arrived.observer);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod feed;
pub mod navigator;
pub mod route;
pub mod session;

pub use error::{LocationError, NavigationError, Result, RouteError};
pub use feed::{
    ChannelSource, FeedConfig, FeedHandle, FixStream, LocationFeed, LocationSource,
    ScriptedSource, SimulatedWalk,
};
pub use navigator::{Navigator, NavigatorConfig, NavigatorHandle, NavigatorSnapshot};
pub use route::{external_directions_url, PathKind, RoutePath, RouteProvider, RouteSource};
pub use session::{
    NavigationSession, RequestId, RouteRequest, SessionState, Transition,
    DEFAULT_ARRIVAL_THRESHOLD_KM,
};
