//! Great-circle math on a spherical Earth.
//!
//! The Haversine formula calculates the great-circle distance between two points
//! on a sphere given their longitudes and latitudes. Bearing and destination
//! point use the same spherical model.

use crate::Coordinate;

/// Earth's mean radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Earth's mean radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculates the great-circle distance between two coordinates in kilometers.
///
/// Symmetric in its arguments and zero for identical points.
///
/// # Example
/// ```
/// use pulsepoint_geo::{distance_km, Coordinate};
///
/// let berlin = Coordinate::new(52.5200, 13.4050);
/// let paris = Coordinate::new(48.8566, 2.3522);
///
/// let distance = distance_km(&berlin, &paris);
/// assert!((distance - 878.0).abs() < 10.0);
/// ```
#[inline]
pub fn distance_km(from: &Coordinate, to: &Coordinate) -> f64 {
    distance_with_radius(from, to, EARTH_RADIUS_KM)
}

/// Calculates the great-circle distance between two coordinates in meters.
#[inline]
pub fn distance_m(from: &Coordinate, to: &Coordinate) -> f64 {
    distance_with_radius(from, to, EARTH_RADIUS_M)
}

#[inline]
fn distance_with_radius(from: &Coordinate, to: &Coordinate, radius: f64) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();

    let d_lat = lat2 - lat1;
    let d_lon = lon2 - lon1;

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push `a` just past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    radius * c
}

/// Initial bearing (forward azimuth) from `from` towards `to`.
///
/// # Returns
/// Degrees clockwise from true north, in `[0, 360)`. Identical points yield 0.
pub fn initial_bearing(from: &Coordinate, to: &Coordinate) -> f64 {
    let (lat1, lon1) = from.to_radians();
    let (lat2, lon2) = to.to_radians();
    let d_lon = lon2 - lon1;

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    let bearing = y.atan2(x).to_degrees().rem_euclid(360.0);
    // rem_euclid of a tiny negative angle rounds up to exactly 360
    if bearing >= 360.0 { 0.0 } else { bearing }
}

/// Point reached by travelling `distance_km` from `origin` along `bearing_deg`.
///
/// Longitude is normalised back into `[-180, 180]`.
pub fn destination_point(origin: &Coordinate, bearing_deg: f64, distance_km: f64) -> Coordinate {
    let (lat1, lon1) = origin.to_radians();
    let bearing = bearing_deg.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    let longitude = (lon2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    Coordinate::new(lat2.to_degrees(), longitude)
}

/// Total length of a polyline in kilometers.
pub fn path_length_km(points: &[Coordinate]) -> f64 {
    points.windows(2).map(|w| distance_km(&w[0], &w[1])).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BERLIN: Coordinate = Coordinate::new(52.5200, 13.4050);
    const PARIS: Coordinate = Coordinate::new(48.8566, 2.3522);
    const NEW_YORK: Coordinate = Coordinate::new(40.7128, -74.0060);
    const TOKYO: Coordinate = Coordinate::new(35.6762, 139.6503);
    const MADURAI: Coordinate = Coordinate::new(9.9252, 78.1198);

    #[test]
    fn test_berlin_to_paris() {
        let distance = distance_km(&BERLIN, &PARIS);
        assert!((distance - 878.0).abs() < 5.0, "Berlin-Paris: {}", distance);
    }

    #[test]
    fn test_new_york_to_tokyo() {
        let distance = distance_km(&NEW_YORK, &TOKYO);
        assert!((distance - 10838.0).abs() < 50.0, "NYC-Tokyo: {}", distance);
    }

    #[test]
    fn test_short_urban_distance() {
        let hospital = Coordinate::new(9.9300, 78.1250);
        let distance = distance_km(&MADURAI, &hospital);
        assert!((distance - 0.78).abs() < 0.05, "Madurai: {}", distance);
    }

    #[test]
    fn test_same_point_zero_distance() {
        assert_eq!(distance_km(&BERLIN, &BERLIN), 0.0);
    }

    #[test]
    fn test_antipodal_points_do_not_nan() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(0.0, 180.0);
        let distance = distance_km(&a, &b);
        assert!((distance - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1.0);
    }

    #[test]
    fn test_meters_conversion() {
        let km = distance_km(&BERLIN, &PARIS);
        let meters = distance_m(&BERLIN, &PARIS);
        assert!((meters - km * 1000.0).abs() < 1.0);
    }

    #[test]
    fn test_cardinal_bearings() {
        let origin = Coordinate::new(0.0, 0.0);
        assert!((initial_bearing(&origin, &Coordinate::new(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((initial_bearing(&origin, &Coordinate::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((initial_bearing(&origin, &Coordinate::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((initial_bearing(&origin, &Coordinate::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_destination_point_roundtrip_distance() {
        let bearing = initial_bearing(&MADURAI, &Coordinate::new(9.9300, 78.1250));
        let moved = destination_point(&MADURAI, bearing, 0.5);
        assert!((distance_km(&MADURAI, &moved) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_destination_point_wraps_longitude() {
        let moved = destination_point(&Coordinate::new(0.0, 179.9), 90.0, 50.0);
        assert!(moved.is_valid());
        assert!(moved.longitude < 0.0);
    }

    #[test]
    fn test_path_length() {
        let path = [BERLIN, PARIS, BERLIN];
        let expected = 2.0 * distance_km(&BERLIN, &PARIS);
        assert!((path_length_km(&path) - expected).abs() < 1e-9);
        assert_eq!(path_length_km(&[BERLIN]), 0.0);
    }

    fn coordinate() -> impl Strategy<Value = Coordinate> {
        (-90.0f64..=90.0, -180.0f64..=180.0).prop_map(|(lat, lng)| Coordinate::new(lat, lng))
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(a in coordinate(), b in coordinate()) {
            prop_assert!((distance_km(&a, &b) - distance_km(&b, &a)).abs() < 1e-6);
        }

        #[test]
        fn prop_distance_to_self_is_zero(a in coordinate()) {
            prop_assert_eq!(distance_km(&a, &a), 0.0);
        }

        #[test]
        fn prop_distance_is_bounded(a in coordinate(), b in coordinate()) {
            let d = distance_km(&a, &b);
            prop_assert!(d >= 0.0);
            prop_assert!(d <= std::f64::consts::PI * EARTH_RADIUS_KM + 1e-6);
        }

        #[test]
        fn prop_bearing_in_range(a in coordinate(), b in coordinate()) {
            let bearing = initial_bearing(&a, &b);
            prop_assert!((0.0..360.0).contains(&bearing));
        }
    }
}
