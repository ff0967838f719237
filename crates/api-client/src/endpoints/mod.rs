//! Endpoint-specific API implementations
//!
//! | Module | Service | Description |
//! |--------|---------|-------------|
//! | `facilities` | facility backend `/hospitals` | list current facilities, server-side radius search |
//! | `routing` | OSRM `/route/v1` | road geometry between two coordinates |

pub mod facilities;
pub mod routing;

pub use facilities::{FacilitiesApi, FacilityRecord};
pub use routing::{RouteGeometry, RoutingApi};
