//! Geographic calculations

use crate::types::Coordinates;

/// Earth radius in kilometers
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two points in kilometers
pub fn haversine_distance(from: &Coordinates, to: &Coordinates) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lon = (to.lng - from.lng).to_radians();

    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    EARTH_RADIUS_KM * 2.0 * a.sqrt().asin()
}

/// Estimated road distance in meters and driving time in seconds.
///
/// `road_coefficient` scales the straight line up to a road network length.
pub fn estimate_leg(
    from: &Coordinates,
    to: &Coordinates,
    road_coefficient: f64,
    average_speed_kmh: f64,
) -> (u64, u64) {
    let road_km = haversine_distance(from, to) * road_coefficient;
    let meters = (road_km * 1000.0) as u64;
    let seconds = (road_km / average_speed_kmh * 3600.0) as u64;
    (meters, seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_sydney_newcastle() {
        let sydney = Coordinates::new(-33.8688, 151.2093);
        let newcastle = Coordinates::new(-32.9283, 151.7817);

        let distance = haversine_distance(&sydney, &newcastle);

        // ~117 km as the crow flies
        assert!((distance - 117.0).abs() < 5.0, "got {} km", distance);
    }

    #[test]
    fn test_haversine_same_point() {
        let point = Coordinates::new(-33.0, 151.0);
        assert!(haversine_distance(&point, &point).abs() < 0.001);
    }

    #[test]
    fn test_estimate_leg_scales_with_coefficient_and_speed() {
        let from = Coordinates::new(-33.0, 151.0);
        let to = Coordinates::new(-33.0, 151.5);

        let (m1, s1) = estimate_leg(&from, &to, 1.0, 60.0);
        let (m2, s2) = estimate_leg(&from, &to, 1.3, 60.0);
        let (_, s3) = estimate_leg(&from, &to, 1.0, 30.0);

        assert!(m2 > m1);
        assert!(s2 > s1);
        // half the speed, twice the time (within truncation)
        assert!((s3 as i64 - 2 * s1 as i64).abs() <= 2);
    }
}
