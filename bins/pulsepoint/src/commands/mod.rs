//! CLI command implementations

pub mod config;
pub mod find;
pub mod navigate;
pub mod nearby;
pub mod route;

use pulsepoint_geo::Coordinate;
use pulsepoint_navigation::{RouteError, RouteSource};

/// Route source for `--offline`: always fails, so routes fall back to a
/// straight line.
pub struct Offline;

impl RouteSource for Offline {
    async fn fetch(
        &self,
        _origin: Coordinate,
        _destination: Coordinate,
    ) -> Result<Vec<Coordinate>, RouteError> {
        Err(RouteError::Unavailable("routing disabled with --offline".to_string()))
    }
}
