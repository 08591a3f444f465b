//! Ellipsoidal distance on WGS-84

use crate::models::Coordinate;
use ::geo::{Distance, Geodesic, Point};

/// Geodesic distance between two coordinates in kilometers
///
/// Uses Karney's solution of the inverse problem, which converges for
/// every pair including nearly antipodal ones.
pub fn geodesic_km(from: Coordinate, to: Coordinate) -> f64 {
    let meters = Geodesic.distance(point(from), point(to));
    meters / 1000.0
}

fn point(coordinate: Coordinate) -> Point<f64> {
    Point::new(coordinate.lon, coordinate.lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() < tolerance,
            "expected {expected} ± {tolerance}, got {actual}"
        );
    }

    #[test]
    fn test_identical_points() {
        let p = Coordinate::new(48.85, 2.35);
        assert_close(geodesic_km(p, p), 0.0, 1e-9);
    }

    #[test]
    fn test_one_degree_along_equator() {
        let d = geodesic_km(Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 1.0));
        assert_close(d, 111.319_491, 1e-3);
    }

    #[test]
    fn test_one_degree_along_meridian() {
        let d = geodesic_km(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert_close(d, 110.574_389, 1e-3);
    }

    #[test]
    fn test_symmetric() {
        let a = Coordinate::new(-33.92, 18.42);
        let b = Coordinate::new(35.68, 139.69);
        assert_close(geodesic_km(a, b), 14_729.08, 0.01);
        assert_close(geodesic_km(a, b), geodesic_km(b, a), 1e-6);
    }

    #[test]
    fn test_nearly_antipodal_pairs_stay_ellipsoidal() {
        for (a, b, expected) in [
            ((0.0, 0.0), (0.5, 179.7), 19_944.13),
            ((10.0, 20.0), (-10.2, -160.1), 19_981.12),
        ] {
            let d = geodesic_km(Coordinate::new(a.0, a.1), Coordinate::new(b.0, b.1));
            assert_close(d, expected, 0.02);
        }
    }
}
