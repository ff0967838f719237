//! Route acquisition with a straight line fallback.
//!
//! [`RouteProvider::fetch_route`] always yields a usable [`RoutePath`]. When
//! the routing service fails, times out or answers with unusable geometry,
//! the path degrades to `[origin, destination]` and is tagged
//! [`PathKind::Fallback`].

use crate::error::RouteError;
use pulsepoint_api_client::endpoints::RoutingApi;
use pulsepoint_geo::{path_length_km, Coordinate};
use pulsepoint_telemetry::{metrics, Timer};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Anything that can produce road geometry between two points.
pub trait RouteSource: Send + Sync + 'static {
    /// Ordered geometry from `origin` to `destination`.
    fn fetch(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> impl Future<Output = Result<Vec<Coordinate>, RouteError>> + Send;
}

impl RouteSource for RoutingApi {
    async fn fetch(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Coordinate>, RouteError> {
        let geometry = self.route(&origin, &destination).await?;
        Ok(geometry.coordinates)
    }
}

/// Where a path came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathKind {
    /// Geometry returned by the routing service
    Provider,
    /// Straight line used because the service could not be used
    Fallback,
}

/// Polyline from origin to destination, at least two points long.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePath {
    points: Vec<Coordinate>,
    kind: PathKind,
}

impl RoutePath {
    /// The two point fallback path.
    pub fn straight_line(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            points: vec![origin, destination],
            kind: PathKind::Fallback,
        }
    }

    /// Wrap service geometry, or `None` if it is too short or has an
    /// out-of-range point.
    pub fn from_provider(points: Vec<Coordinate>) -> Option<Self> {
        if points.len() < 2 || !points.iter().all(Coordinate::is_valid) {
            return None;
        }
        Some(Self {
            points,
            kind: PathKind::Provider,
        })
    }

    pub fn points(&self) -> &[Coordinate] {
        &self.points
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn is_fallback(&self) -> bool {
        self.kind == PathKind::Fallback
    }

    pub fn origin(&self) -> Coordinate {
        self.points[0]
    }

    pub fn destination(&self) -> Coordinate {
        self.points[self.points.len() - 1]
    }

    /// Sum of the great-circle segment lengths.
    pub fn length_km(&self) -> f64 {
        path_length_km(&self.points)
    }
}

/// Fetches routes from a [`RouteSource`], degrading to a straight line.
///
/// Cheap to clone; clones share the source.
#[derive(Debug)]
pub struct RouteProvider<S> {
    source: Arc<S>,
}

impl<S> Clone for RouteProvider<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S: RouteSource> RouteProvider<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
        }
    }

    /// Route from `origin` to `destination`. Never fails.
    pub async fn fetch_route(&self, origin: Coordinate, destination: Coordinate) -> RoutePath {
        let timer = Timer::start("routing.fetch_ms");
        let result = self.source.fetch(origin, destination).await;
        let elapsed = timer.stop();

        let error = match result {
            Ok(points) => {
                let count = points.len();
                match RoutePath::from_provider(points) {
                    Some(path) => {
                        debug!(
                            points = count,
                            length_km = path.length_km(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            "Route acquired"
                        );
                        return path;
                    }
                    None => RouteError::Malformed(format!("unusable geometry with {count} point(s)")),
                }
            }
            Err(e) => e,
        };

        metrics().increment("routing.fallbacks");
        warn!(
            code = %error.code(),
            error = %error,
            %origin,
            %destination,
            "Routing failed, using straight line"
        );
        RoutePath::straight_line(origin, destination)
    }
}

/// Driving directions in Google Maps, for handing off to a phone.
pub fn external_directions_url(origin: &Coordinate, destination: &Coordinate) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={},{}&destination={},{}&travelmode=driving",
        origin.latitude, origin.longitude, destination.latitude, destination.longitude
    )
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::time::Duration;

    pub(crate) const ORIGIN: Coordinate = Coordinate::new(9.9252, 78.1198);
    pub(crate) const DESTINATION: Coordinate = Coordinate::new(9.9300, 78.1250);

    /// Answers with a fixed result after an optional delay.
    pub(crate) struct FixedSource {
        pub(crate) result: Result<Vec<Coordinate>, String>,
        pub(crate) delay: Duration,
    }

    impl RouteSource for FixedSource {
        async fn fetch(
            &self,
            _origin: Coordinate,
            _destination: Coordinate,
        ) -> Result<Vec<Coordinate>, RouteError> {
            tokio::time::sleep(self.delay).await;
            self.result.clone().map_err(RouteError::Unavailable)
        }
    }

    fn provider(result: Result<Vec<Coordinate>, String>) -> RouteProvider<FixedSource> {
        RouteProvider::new(FixedSource {
            result,
            delay: Duration::ZERO,
        })
    }

    #[tokio::test]
    async fn test_provider_geometry_is_used() {
        let middle = Coordinate::new(9.9275, 78.1220);
        let path = provider(Ok(vec![ORIGIN, middle, DESTINATION]))
            .fetch_route(ORIGIN, DESTINATION)
            .await;

        assert_eq!(path.kind(), PathKind::Provider);
        assert_eq!(path.points(), &[ORIGIN, middle, DESTINATION]);
        assert!(path.length_km() >= pulsepoint_geo::distance_km(&ORIGIN, &DESTINATION));
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_straight_line() {
        let path = provider(Err("connection refused".into()))
            .fetch_route(ORIGIN, DESTINATION)
            .await;

        assert!(path.is_fallback());
        assert_eq!(path.points(), &[ORIGIN, DESTINATION]);
        assert_eq!(path.origin(), ORIGIN);
        assert_eq!(path.destination(), DESTINATION);
    }

    #[tokio::test]
    async fn test_short_geometry_falls_back() {
        let path = provider(Ok(vec![ORIGIN])).fetch_route(ORIGIN, DESTINATION).await;
        assert_eq!(path, RoutePath::straight_line(ORIGIN, DESTINATION));
    }

    #[tokio::test]
    async fn test_invalid_geometry_falls_back() {
        let path = provider(Ok(vec![ORIGIN, Coordinate::new(120.0, 78.0), DESTINATION]))
            .fetch_route(ORIGIN, DESTINATION)
            .await;
        assert!(path.is_fallback());
    }

    #[tokio::test]
    async fn test_fallback_is_counted() {
        let before = metrics().counter("routing.fallbacks");
        provider(Err("timeout".into())).fetch_route(ORIGIN, DESTINATION).await;
        assert!(metrics().counter("routing.fallbacks") > before);
    }

    #[test]
    fn test_from_provider_rejects_short_paths() {
        assert!(RoutePath::from_provider(vec![]).is_none());
        assert!(RoutePath::from_provider(vec![ORIGIN]).is_none());
        assert!(RoutePath::from_provider(vec![ORIGIN, DESTINATION]).is_some());
    }

    #[test]
    fn test_external_directions_url() {
        let url = external_directions_url(&ORIGIN, &DESTINATION);
        assert_eq!(
            url,
            "https://www.google.com/maps/dir/?api=1&origin=9.9252,78.1198&destination=9.93,78.125&travelmode=driving"
        );
    }
}
