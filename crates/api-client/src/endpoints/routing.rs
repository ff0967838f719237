//! OSRM routing endpoint
//!
//! Only the route geometry is consumed. Everything else in the response
//! (legs, waypoints, annotations) is ignored.

use crate::client::{PulsePointClient, Service};
use crate::error::{ApiError, ApiResult};
use pulsepoint_geo::Coordinate;
use serde::Deserialize;
use tracing::{debug, instrument};

/// Road geometry between two coordinates as reported by the service
#[derive(Debug, Clone, PartialEq)]
pub struct RouteGeometry {
    /// Ordered points, origin first
    pub coordinates: Vec<Coordinate>,
    /// Road distance in meters, when reported
    pub distance_m: Option<f64>,
    /// Expected travel time in seconds, when reported
    pub duration_s: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    #[serde(default)]
    geometry: Option<OsrmGeometry>,
    #[serde(default)]
    distance: Option<f64>,
    #[serde(default)]
    duration: Option<f64>,
}

/// GeoJSON line string, points as `[longitude, latitude]`
#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

/// Extract the first route's geometry from an OSRM response body
pub fn parse_route_response(body: serde_json::Value) -> ApiResult<RouteGeometry> {
    let response: OsrmResponse = serde_json::from_value(body)?;

    if response.code != "Ok" {
        return Err(ApiError::malformed_route(format!(
            "service answered {}: {}",
            response.code,
            response.message.unwrap_or_default()
        )));
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::malformed_route("no routes in response"))?;

    let geometry = route
        .geometry
        .ok_or_else(|| ApiError::malformed_route("route has no geometry"))?;

    let coordinates: Vec<Coordinate> = geometry
        .coordinates
        .into_iter()
        .map(|[lng, lat]| Coordinate::new(lat, lng))
        .collect();

    if coordinates.len() < 2 {
        return Err(ApiError::malformed_route(format!(
            "geometry has {} point(s), need at least 2",
            coordinates.len()
        )));
    }

    if let Some(bad) = coordinates.iter().find(|c| !c.is_valid()) {
        return Err(ApiError::malformed_route(format!(
            "geometry contains invalid point {bad}"
        )));
    }

    Ok(RouteGeometry {
        coordinates,
        distance_m: route.distance,
        duration_s: route.duration,
    })
}

/// Routing API endpoints
pub struct RoutingApi {
    client: PulsePointClient,
}

impl RoutingApi {
    pub(crate) fn new(client: PulsePointClient) -> Self {
        Self { client }
    }

    /// URL of the route request, without query parameters
    #[must_use]
    pub fn route_url(&self, origin: &Coordinate, destination: &Coordinate) -> String {
        let config = self.client.config();
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            config.routing_url.trim_end_matches('/'),
            config.routing_profile,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude,
        )
    }

    /// Fetch the road geometry from `origin` to `destination`
    #[instrument(skip(self))]
    pub async fn route(
        &self,
        origin: &Coordinate,
        destination: &Coordinate,
    ) -> ApiResult<RouteGeometry> {
        let url = self.route_url(origin, destination);
        let query = [
            ("overview", "full".to_string()),
            ("geometries", "geojson".to_string()),
        ];

        let body: serde_json::Value = self.client.get_url(Service::Routing, &url, &query).await?;
        let geometry = parse_route_response(body)?;

        debug!(
            points = geometry.coordinates.len(),
            distance_m = geometry.distance_m,
            "Route geometry received"
        );
        Ok(geometry)
    }
}
