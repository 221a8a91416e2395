//! Polygon set operations and line/polygon clipping shared by the
//! discretizer, lawnmower synthesizer, and planner.
//!
//! `geo::BooleanOps` (see the doc comment listing it in the `georust-geo`
//! reference file pulled into this pack) covers polygon/multipolygon
//! intersection, union, and difference directly, replacing shapely's
//! `.intersection()`/`.difference()`/`unary_union()` calls in
//! `core/discretization.py`. It does not cover clipping an arbitrary
//! (LineString, Polygon) pair to the geometry actually inside the polygon —
//! that is implemented here by hand, the way
//! `core/mission_logic.py::build_lawnmower_path_for_cell_metric` and
//! `core/aco.py::_clip_route_to_polygon` rely on shapely's
//! `LineString.intersection(Polygon)` to do it.

use geo::{Area, BooleanOps, Coord, CoordinatePosition, CoordsIter, Polygon as GeoPolygon};
use geo_types::{coordinate_position::CoordPos, MultiPolygon};

use crate::types::ClipResult;

/// Buffers a (simple, possibly non-convex) polygon outward by `distance`
/// meters using a miter-join edge offset: every edge is pushed along its
/// outward normal and consecutive offset edges are re-intersected as
/// infinite lines to find the new vertex. `distance < 0` buffers inward.
///
/// This approximates a true Minkowski-sum buffer (the general operation
/// shapely's `.buffer()` performs) well for the gently convex area-of-interest
/// and obstacle shapes this crate targets; deep local concavities can make the
/// offset ring self-intersect. No attempt is made to repair that here —
/// callers fall back to the unbuffered polygon on a degenerate (near-zero
/// area) result, following the fail-open rule for geometry exceptions.
pub fn offset_polygon(poly: &GeoPolygon<f64>, distance: f64) -> GeoPolygon<f64> {
    let ring: Vec<Coord<f64>> = poly.exterior().coords_iter().collect();
    if ring.len() < 4 || distance == 0.0 {
        return poly.clone();
    }
    // drop the closing duplicate vertex
    let verts = &ring[..ring.len() - 1];
    let n = verts.len();

    let normal = |a: Coord<f64>, b: Coord<f64>| -> (f64, f64) {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        let len = (dx * dx + dy * dy).sqrt().max(1e-12);
        (dy / len, -dx / len) // rotate direction by -90 deg: outward for a CCW ring
    };

    // offset each edge to a parallel line (p0, p1)
    let mut offset_edges = Vec::with_capacity(n);
    for i in 0..n {
        let a = verts[i];
        let b = verts[(i + 1) % n];
        let (nx, ny) = normal(a, b);
        offset_edges.push((
            Coord { x: a.x + nx * distance, y: a.y + ny * distance },
            Coord { x: b.x + nx * distance, y: b.y + ny * distance },
        ));
    }

    let mut new_verts = Vec::with_capacity(n + 1);
    for i in 0..n {
        let (p0, p1) = offset_edges[(i + n - 1) % n];
        let (q0, q1) = offset_edges[i];
        new_verts.push(line_intersection_infinite(p0, p1, q0, q1).unwrap_or(q0));
    }
    new_verts.push(new_verts[0]);

    GeoPolygon::new(geo::LineString::from(new_verts), vec![])
}

/// Intersection of two infinite lines, or `None` if parallel.
fn line_intersection_infinite(p0: Coord<f64>, p1: Coord<f64>, q0: Coord<f64>, q1: Coord<f64>) -> Option<Coord<f64>> {
    let d1x = p1.x - p0.x;
    let d1y = p1.y - p0.y;
    let d2x = q1.x - q0.x;
    let d2y = q1.y - q0.y;
    let denom = d1x * d2y - d1y * d2x;
    if denom.abs() < 1e-12 {
        return None;
    }
    let t = ((q0.x - p0.x) * d2y - (q0.y - p0.y) * d2x) / denom;
    Some(Coord { x: p0.x + t * d1x, y: p0.y + t * d1y })
}

/// Union of a list of polygons, per `unary_union(obstacles)`.
pub fn union_all(polys: &[GeoPolygon<f64>]) -> MultiPolygon<f64> {
    let mut acc = MultiPolygon::new(vec![]);
    for p in polys {
        let single = MultiPolygon::new(vec![p.clone()]);
        acc = acc.union(&single);
    }
    acc
}

/// `area \ union(obstacles)`, matching `free_space = A_inner.difference(unary_union(ObstaclesBuf))`.
pub fn difference_from_obstacles(area: &GeoPolygon<f64>, obstacles: &[GeoPolygon<f64>]) -> MultiPolygon<f64> {
    let area_multi = MultiPolygon::new(vec![area.clone()]);
    if obstacles.is_empty() {
        return area_multi;
    }
    let obstacles_multi = union_all(obstacles);
    area_multi.difference(&obstacles_multi)
}

/// `a ∩ b`, returning the single largest resulting polygon by area (matching
/// `if isinstance(C, MultiPolygon): C = max(C.geoms, key=lambda g: g.area)`).
pub fn intersect_keep_largest(a: &GeoPolygon<f64>, b: &MultiPolygon<f64>) -> Option<GeoPolygon<f64>> {
    let a_multi = MultiPolygon::new(vec![a.clone()]);
    let result = a_multi.intersection(b);
    largest_polygon(&result)
}

/// The largest-by-area polygon in a `MultiPolygon`, or `None` if empty.
pub fn largest_polygon(mp: &MultiPolygon<f64>) -> Option<GeoPolygon<f64>> {
    mp.0.iter()
        .max_by(|a, b| a.unsigned_area().partial_cmp(&b.unsigned_area()).unwrap())
        .cloned()
}

/// `true` if `coord` lies inside or on the boundary of `poly`.
pub fn contains_or_on_boundary(poly: &GeoPolygon<f64>, coord: Coord<f64>) -> bool {
    matches!(
        poly.coordinate_position(&coord),
        CoordPos::Inside | CoordPos::OnBoundary
    )
}

/// Clips a polyline (geo `(x, y)` = `(lon, lat)` convention) to the portion(s)
/// lying inside `poly`, folding the `Empty | Line | Multi` sum type the
/// way shapely's `LineString.intersection(Polygon)` would, per the "Dynamic
/// dispatch over geometry types" design note. Degenerate (single-point) runs
/// are dropped, matching the original's silent-skip of empty intersections.
pub fn clip_linestring_to_polygon(points: &[Coord<f64>], poly: &GeoPolygon<f64>) -> ClipResult {
    if points.len() < 2 {
        return ClipResult::Empty;
    }

    let edges = polygon_edges(poly);

    let mut runs: Vec<Vec<Coord<f64>>> = Vec::new();
    let mut current: Vec<Coord<f64>> = Vec::new();
    let mut inside = contains_or_on_boundary(poly, points[0]);
    if inside {
        current.push(points[0]);
    }

    for w in points.windows(2) {
        let (a, b) = (w[0], w[1]);
        let mut crossings: Vec<(f64, Coord<f64>)> = edges
            .iter()
            .filter_map(|&(q0, q1)| segment_intersection(a, b, q0, q1))
            .collect();
        crossings.sort_by(|x, y| x.0.partial_cmp(&y.0).unwrap());
        crossings.dedup_by(|x, y| (x.0 - y.0).abs() < 1e-9);

        for (_, pt) in crossings {
            if inside {
                current.push(pt);
                if current.len() > 1 {
                    runs.push(std::mem::take(&mut current));
                } else {
                    current.clear();
                }
            } else {
                current = vec![pt];
            }
            inside = !inside;
        }

        if inside {
            current.push(b);
        }
    }

    if inside && current.len() > 1 {
        runs.push(current);
    }

    match runs.len() {
        0 => ClipResult::Empty,
        1 => ClipResult::Line(
            runs.into_iter()
                .next()
                .unwrap()
                .into_iter()
                .map(|c| crate::types::Point::new(c.y, c.x))
                .collect(),
        ),
        _ => ClipResult::Multi(
            runs.into_iter()
                .map(|run| run.into_iter().map(|c| crate::types::Point::new(c.y, c.x)).collect())
                .collect(),
        ),
    }
}

fn polygon_edges(poly: &GeoPolygon<f64>) -> Vec<(Coord<f64>, Coord<f64>)> {
    let mut edges = Vec::new();
    let mut push_ring = |coords: Vec<Coord<f64>>| {
        for w in coords.windows(2) {
            edges.push((w[0], w[1]));
        }
    };
    push_ring(poly.exterior().coords_iter().collect());
    for hole in poly.interiors() {
        push_ring(hole.coords_iter().collect());
    }
    edges
}

/// Segment-segment intersection; returns `(t along a->b, point)` for `t` in
/// `(0, 1)` (endpoints excluded to avoid double-counting shared vertices).
fn segment_intersection(a: Coord<f64>, b: Coord<f64>, c: Coord<f64>, d: Coord<f64>) -> Option<(f64, Coord<f64>)> {
    let r = (b.x - a.x, b.y - a.y);
    let s = (d.x - c.x, d.y - c.y);
    let denom = r.0 * s.1 - r.1 * s.0;
    if denom.abs() < 1e-12 {
        return None;
    }
    let qp = (c.x - a.x, c.y - a.y);
    let t = (qp.0 * s.1 - qp.1 * s.0) / denom;
    let u = (qp.0 * r.1 - qp.1 * r.0) / denom;
    if t > 1e-9 && t < 1.0 - 1e-9 && u >= -1e-9 && u <= 1.0 + 1e-9 {
        Some((t, Coord { x: a.x + t * r.0, y: a.y + t * r.1 }))
    } else {
        None
    }
}

/// Horizontal-line scan: the sorted inside `x`-intervals of `poly` at height
/// `y`, computed by counting ring-edge crossings (even-odd rule, correct for
/// polygons with holes). This is the scanline equivalent of extending a
/// stripe line far past the polygon's bounds and intersecting it, without
/// needing a general line-clip for the axis-aligned case.
pub fn horizontal_scan_intervals(poly: &GeoPolygon<f64>, y: f64) -> Vec<(f64, f64)> {
    let mut xs: Vec<f64> = Vec::new();
    let mut scan_ring = |coords: Vec<Coord<f64>>| {
        for w in coords.windows(2) {
            let (p0, p1) = (w[0], w[1]);
            let (y0, y1) = (p0.y, p1.y);
            if (y0 <= y && y1 > y) || (y1 <= y && y0 > y) {
                let t = (y - y0) / (y1 - y0);
                xs.push(p0.x + t * (p1.x - p0.x));
            }
        }
    };
    scan_ring(poly.exterior().coords_iter().collect());
    for hole in poly.interiors() {
        scan_ring(hole.coords_iter().collect());
    }
    xs.sort_by(|a, b| a.partial_cmp(b).unwrap());

    xs.chunks_exact(2).map(|c| (c[0], c[1])).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::LineString;

    fn unit_square() -> GeoPolygon<f64> {
        GeoPolygon::new(
            LineString::from(vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 10.0, y: 0.0 },
                Coord { x: 10.0, y: 10.0 },
                Coord { x: 0.0, y: 10.0 },
                Coord { x: 0.0, y: 0.0 },
            ]),
            vec![],
        )
    }

    #[test]
    fn horizontal_scan_of_square_gives_one_interval() {
        let sq = unit_square();
        let ivs = horizontal_scan_intervals(&sq, 5.0);
        assert_eq!(ivs.len(), 1);
        assert!((ivs[0].0 - 0.0).abs() < 1e-9);
        assert!((ivs[0].1 - 10.0).abs() < 1e-9);
    }

    #[test]
    fn horizontal_scan_outside_bounds_is_empty() {
        let sq = unit_square();
        assert!(horizontal_scan_intervals(&sq, 20.0).is_empty());
    }

    #[test]
    fn clip_line_fully_inside_keeps_all_points() {
        let sq = unit_square();
        let pts = vec![Coord { x: 2.0, y: 2.0 }, Coord { x: 8.0, y: 8.0 }];
        let r = clip_linestring_to_polygon(&pts, &sq);
        match r {
            ClipResult::Line(l) => assert_eq!(l.len(), 2),
            other => panic!("expected Line, got {other:?}"),
        }
    }

    #[test]
    fn clip_line_crossing_boundary_is_truncated() {
        let sq = unit_square();
        let pts = vec![Coord { x: -5.0, y: 5.0 }, Coord { x: 15.0, y: 5.0 }];
        let r = clip_linestring_to_polygon(&pts, &sq);
        match r {
            ClipResult::Line(l) => {
                assert_eq!(l.len(), 2);
                assert!((l[0].lon - 0.0).abs() < 1e-6);
                assert!((l[1].lon - 10.0).abs() < 1e-6);
            }
            other => panic!("expected Line, got {other:?}"),
        }
    }

    #[test]
    fn clip_line_fully_outside_is_empty() {
        let sq = unit_square();
        let pts = vec![Coord { x: 100.0, y: 100.0 }, Coord { x: 200.0, y: 200.0 }];
        assert_eq!(clip_linestring_to_polygon(&pts, &sq), ClipResult::Empty);
    }

    #[test]
    fn difference_removes_obstacle_area() {
        let area = unit_square();
        let obstacle = GeoPolygon::new(
            LineString::from(vec![
                Coord { x: 2.0, y: 2.0 },
                Coord { x: 4.0, y: 2.0 },
                Coord { x: 4.0, y: 4.0 },
                Coord { x: 2.0, y: 4.0 },
                Coord { x: 2.0, y: 2.0 },
            ]),
            vec![],
        );
        let free = difference_from_obstacles(&area, &[obstacle]);
        let total_area: f64 = free.0.iter().map(|p| p.unsigned_area()).sum();
        assert!((total_area - 96.0).abs() < 1e-6);
    }
}
