//! Energy-aware coverage stitching, ported statement-for-statement
//! from `core/mission_logic.py::stitch_cell_paths`.

use crate::geo_primitives::planar_distance_km;
use crate::types::{Cell, Point};

fn path_length_km(path: &[Point]) -> f64 {
    path.windows(2).map(|w| planar_distance_km(w[0], w[1])).sum()
}

/// Stitches the ordered cell visit list into one coverage polyline, forcing
/// a return to base whenever the remaining battery range can't cover the
/// next cell's connector + intra-path length plus a landing reserve.
///
/// `order` holds indices into `cells` (not tour indices into `points` —
/// callers strip the base sentinel before calling this, matching
/// `visit_cells = [i - 1 for i in order[1:-1] if i > 0]` in the source).
pub fn stitch_cell_paths(
    cells: &[Cell],
    order: &[usize],
    base: Point,
    reserve_km: f64,
    battery_km: f64,
) -> Vec<Point> {
    fn add_points(mission: &mut Vec<Point>, pos: &mut Point, pts: &[Point]) {
        if pts.is_empty() {
            return;
        }
        mission.extend_from_slice(pts);
        *pos = *pts.last().unwrap();
    }

    let mut mission: Vec<Point> = Vec::new();
    let mut remain = battery_km;
    let mut pos = base;

    for &ci in order {
        let Some(cell) = cells.get(ci) else { continue };
        if cell.sweep_path.is_empty() {
            continue;
        }

        let direct = &cell.sweep_path;
        let rev: Vec<Point> = direct.iter().rev().copied().collect();
        let path: &[Point] = if planar_distance_km(pos, direct[0]) < planar_distance_km(pos, rev[0]) {
            direct.as_slice()
        } else {
            &rev
        };

        let need = planar_distance_km(pos, path[0]) + path_length_km(path);

        if remain < need + reserve_km.max(planar_distance_km(*path.last().unwrap(), base)) {
            if planar_distance_km(pos, base) > 1e-6 {
                let leg = [pos, base];
                add_points(&mut mission, &mut pos, &leg);
            }
            remain = battery_km;
            pos = base;
        }

        if planar_distance_km(pos, path[0]) > 1e-6 {
            let leg = [pos, path[0]];
            add_points(&mut mission, &mut pos, &leg);
        }

        add_points(&mut mission, &mut pos, path);
        remain -= need;
    }

    if planar_distance_km(pos, base) > 1e-6 {
        let leg = [pos, base];
        add_points(&mut mission, &mut pos, &leg);
    }

    mission
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString, Polygon as GeoPolygon};

    fn dummy_cell(index: u32, path: Vec<Point>) -> Cell {
        Cell {
            index,
            geom_metric: GeoPolygon::new(LineString::from(vec![Coord { x: 0.0, y: 0.0 }]), vec![]),
            centroid_metric: (0.0, 0.0),
            centroid_geo: path.first().copied().unwrap_or(Point::new(0.0, 0.0)),
            bbox_geo: (0.0, 0.0, 0.0, 0.0),
            orientation_deg: 0.0,
            sweep_path: path,
            reward: 1.0,
        }
    }

    #[test]
    fn single_cell_stitches_connector_and_return() {
        let base = Point::new(50.0, 30.0);
        let cell = dummy_cell(0, vec![Point::new(50.001, 30.001), Point::new(50.002, 30.001)]);
        let route = stitch_cell_paths(&[cell], &[0], base, 0.2, 10.0);

        assert_eq!(*route.first().unwrap(), base);
        assert_eq!(*route.last().unwrap(), base);
        assert!(route.len() >= 4);
    }

    #[test]
    fn path_is_flipped_when_reversed_endpoint_is_closer() {
        let base = Point::new(50.0, 30.0);
        // forward path starts far from base, ends near it
        let cell = dummy_cell(0, vec![Point::new(50.01, 30.01), Point::new(50.0001, 30.0001)]);
        let route = stitch_cell_paths(&[cell], &[0], base, 0.01, 100.0);
        // the first path point visited should be the one closer to base (50.0001,...)
        let first_path_point = route[1];
        assert!((first_path_point.lat - 50.0001).abs() < 1e-6);
    }

    #[test]
    fn insufficient_battery_forces_a_return_leg() {
        let base = Point::new(50.0, 30.0);
        let far_cell = dummy_cell(0, vec![Point::new(50.2, 30.2), Point::new(50.21, 30.2)]);
        let near_cell = dummy_cell(1, vec![Point::new(50.001, 30.001), Point::new(50.002, 30.001)]);
        // battery is enough for only one long leg
        let route = stitch_cell_paths(&[far_cell, near_cell], &[0, 1], base, 0.1, 30.0);
        // base must appear somewhere in the middle (forced return) before the final return
        let base_occurrences = route.iter().filter(|&&p| planar_distance_km(p, base) < 1e-6).count();
        assert!(base_occurrences >= 2);
    }

    #[test]
    fn empty_order_returns_empty_route() {
        let base = Point::new(50.0, 30.0);
        let route = stitch_cell_paths(&[], &[], base, 0.1, 10.0);
        assert!(route.is_empty());
    }
}
