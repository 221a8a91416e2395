//! Projection and geo primitives. Two transforms between geographic
//! (EPSG:4326) and an equal-area metric frame, bearing, and planar distance.
//!
//! A prior iteration of this crate reached for the `proj` crate's NZTM
//! transformer for exactly this job; that is dropped here (DESIGN.md) because
//! the equal-area transform needed here is a closed-form cylindrical
//! equal-area projection good to a <0.5%-over-50km accuracy target, not a
//! full PROJ/EPSG pipeline, and because this crate must not assume a system
//! PROJ installation is available to every caller. The formulas below
//! are grounded in `core/discretization.py::project_to_metric_latlon` /
//! `project_to_geo_latlon` (which wrap EPSG:6933, a cylindrical equal-area
//! CRS) and `core/utils.py::bearing_deg` / `ll_dist_km`.

use std::f64::consts::PI;

use crate::types::{MetricPoint, Point};

/// Mean Earth radius in meters, matching EPSG:6933's authalic sphere.
const EARTH_RADIUS_M: f64 = 6371000.0;
const KM_PER_DEG: f64 = 111.0;

/// `(lat, lon)` degrees -> `(x, y)` meters, cylindrical equal-area.
pub fn to_metric(p: Point) -> MetricPoint {
    let lat_rad = p.lat.to_radians();
    let lon_rad = p.lon.to_radians();
    MetricPoint::new(EARTH_RADIUS_M * lon_rad, EARTH_RADIUS_M * lat_rad.sin())
}

/// Inverse of `to_metric`.
pub fn to_geo(p: MetricPoint) -> Point {
    let lat = (p.y / EARTH_RADIUS_M).asin().to_degrees();
    let lon = (p.x / EARTH_RADIUS_M).to_degrees();
    Point::new(lat, lon)
}

/// Great-circle bearing from `p1` to `p2`, degrees clockwise from north,
/// in `[0, 360)`. Spherical formula.
pub fn bearing_deg(p1: Point, p2: Point) -> f64 {
    let lat1 = p1.lat.to_radians();
    let lat2 = p2.lat.to_radians();
    let dlon = (p2.lon - p1.lon).to_radians();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    (x.atan2(y).to_degrees() + 360.0) % 360.0
}

/// Equirectangular planar distance approximation in km:
/// `(dlon*cos(mean_lat), dlat) * 111.0 km/deg`.
pub fn planar_distance_km(p1: Point, p2: Point) -> f64 {
    let mean_lat = ((p1.lat + p2.lat) / 2.0).to_radians();
    let dx = (p2.lon - p1.lon) * mean_lat.cos() * KM_PER_DEG;
    let dy = (p2.lat - p1.lat) * KM_PER_DEG;
    (dx * dx + dy * dy).sqrt()
}

/// Rotates a metric point by `angle_deg` (positive = counterclockwise) about
/// `origin`. Mirrors the inline rotation in
/// `flight_path.rs::generate_coverage_rect` (`x*cos - y*sin`).
pub fn rotate_point(p: MetricPoint, origin: MetricPoint, angle_deg: f64) -> MetricPoint {
    let angle_rad = angle_deg * PI / 180.0;
    let (sin, cos) = angle_rad.sin_cos();
    let dx = p.x - origin.x;
    let dy = p.y - origin.y;
    MetricPoint::new(
        origin.x + dx * cos - dy * sin,
        origin.y + dx * sin + dy * cos,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_roundtrip_is_accurate_within_tolerance() {
        let p = Point::new(50.45, 30.52);
        let back = to_geo(to_metric(p));
        assert!((back.lat - p.lat).abs() < 1e-6);
        assert!((back.lon - p.lon).abs() < 1e-6);
    }

    #[test]
    fn bearing_due_north_is_zero() {
        let p1 = Point::new(50.0, 30.0);
        let p2 = Point::new(50.01, 30.0);
        let b = bearing_deg(p1, p2);
        assert!(b.abs() < 0.5 || (b - 360.0).abs() < 0.5);
    }

    #[test]
    fn bearing_due_east_is_ninety() {
        let p1 = Point::new(50.0, 30.0);
        let p2 = Point::new(50.0, 30.01);
        let b = bearing_deg(p1, p2);
        assert!((b - 90.0).abs() < 1.0);
    }

    #[test]
    fn planar_distance_matches_metric_distance_within_half_percent() {
        // accuracy target: <0.5% over spans <= 50 km
        let p1 = Point::new(50.45, 30.52);
        let p2 = Point::new(50.65, 30.82);
        let km = planar_distance_km(p1, p2);

        let m1 = to_metric(p1);
        let m2 = to_metric(p2);
        let metric_km = ((m2.x - m1.x).powi(2) + (m2.y - m1.y).powi(2)).sqrt() / 1000.0;

        let rel_err = (km - metric_km).abs() / metric_km;
        assert!(rel_err < 0.005, "relative error {rel_err} too large");
    }

    #[test]
    fn rotate_point_preserves_origin_distance() {
        let origin = MetricPoint::new(10.0, 10.0);
        let p = MetricPoint::new(15.0, 10.0);
        let rotated = rotate_point(p, origin, 90.0);
        let d_before = ((p.x - origin.x).powi(2) + (p.y - origin.y).powi(2)).sqrt();
        let d_after = ((rotated.x - origin.x).powi(2) + (rotated.y - origin.y).powi(2)).sqrt();
        assert!((d_before - d_after).abs() < 1e-9);
    }
}
