//! Per-cell lawnmower sweep synthesis, ported from
//! `core/mission_logic.py::build_lawnmower_path_for_cell_metric` and
//! `extract_lines`.

use geo::{BoundingRect, Centroid, Coord, LineString, Polygon as GeoPolygon};

use crate::clip::horizontal_scan_intervals;
use crate::geo_primitives::{rotate_point, to_geo};
use crate::types::{MetricPoint, Point};

/// Builds the snake-ordered lawnmower path for one cell, in geographic
/// frame.
///
/// `cell_geom_metric` is the cell's clipped polygon in the metric frame
/// (already produced by the discretizer); `orientation_deg` is the cell's
/// preferred sweep azimuth; `delta_perp_m` is the lane spacing; `w_m` is the
/// sensor swath, used to over-extend each stripe past the polygon's bounds
/// so the scanline always starts and ends outside it.
pub fn build_lawnmower_path_for_cell(
    cell_geom_metric: &GeoPolygon<f64>,
    orientation_deg: f32,
    delta_perp_m: f64,
    w_m: f64,
) -> Vec<Point> {
    let centroid = match cell_geom_metric.centroid() {
        Some(c) => MetricPoint::new(c.x(), c.y()),
        None => return Vec::new(),
    };

    let phi = orientation_deg as f64;
    let rotated = rotate_polygon(cell_geom_metric, centroid, -phi);

    let bbox = match rotated.bounding_rect() {
        Some(b) => b,
        None => return Vec::new(),
    };
    let (minx, miny, maxx, maxy) = (bbox.min().x, bbox.min().y, bbox.max().x, bbox.max().y);
    let height = maxy - miny;
    if height < 1.0 {
        return Vec::new();
    }

    let lane_step = delta_perp_m.max(1.0);
    let n_lanes = ((height / lane_step) as usize + 1).max(2);

    // Each lane is a scanline at y = miny + i*lane_step, extended 3*W_m past
    // the polygon's x-bounds on either side in the original, which builds
    // this as an explicit oversized segment; `horizontal_scan_intervals`
    // finds the portion(s) of it actually inside the rotated polygon
    // directly, equivalent to intersecting the oversized segment with the
    // polygon without constructing the segment at all.
    let _ = (minx, maxx, w_m); // extension bounds are implicit in the scanline

    struct Segment {
        centroid_y: f64,
        start: Coord<f64>,
        end: Coord<f64>,
    }

    let mut segments: Vec<Segment> = Vec::new();
    for i in 0..n_lanes {
        let y = miny + i as f64 * lane_step;
        for (x0, x1) in horizontal_scan_intervals(&rotated, y) {
            if (x1 - x0).abs() < 1e-9 {
                continue; // degenerate (point) intersection
            }
            segments.push(Segment {
                centroid_y: y,
                start: Coord { x: x0, y },
                end: Coord { x: x1, y },
            });
        }
    }

    if segments.is_empty() {
        return Vec::new();
    }

    segments.sort_by(|a, b| a.centroid_y.partial_cmp(&b.centroid_y).unwrap());

    let mut result_xy: Vec<Coord<f64>> = Vec::new();
    for (i, seg) in segments.iter().enumerate() {
        if i % 2 == 0 {
            result_xy.push(seg.start);
            result_xy.push(seg.end);
        } else {
            result_xy.push(seg.end);
            result_xy.push(seg.start);
        }
    }

    if result_xy.is_empty() {
        return Vec::new();
    }

    result_xy
        .into_iter()
        .map(|c| {
            let back = rotate_point(MetricPoint::new(c.x, c.y), centroid, phi);
            to_geo(back)
        })
        .collect()
}

fn rotate_polygon(poly: &GeoPolygon<f64>, origin: MetricPoint, angle_deg: f64) -> GeoPolygon<f64> {
    let rotate_ring = |ring: &LineString<f64>| -> LineString<f64> {
        LineString::from(
            ring.coords()
                .map(|&c| {
                    let r = rotate_point(MetricPoint::new(c.x, c.y), origin, angle_deg);
                    Coord { x: r.x, y: r.y }
                })
                .collect::<Vec<_>>(),
        )
    };

    GeoPolygon::new(
        rotate_ring(poly.exterior()),
        poly.interiors().iter().map(rotate_ring).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    fn square_metric(half: f64) -> GeoPolygon<f64> {
        GeoPolygon::new(
            LineString::from(vec![
                Coord { x: -half, y: -half },
                Coord { x: half, y: -half },
                Coord { x: half, y: half },
                Coord { x: -half, y: half },
                Coord { x: -half, y: -half },
            ]),
            vec![],
        )
    }

    #[test]
    fn lawnmower_path_is_nonempty_for_a_reasonable_cell() {
        let cell = square_metric(50.0);
        let path = build_lawnmower_path_for_cell(&cell, 0.0, 20.0, 30.0);
        assert!(!path.is_empty());
        assert_eq!(path.len() % 2, 0);
    }

    #[test]
    fn lawnmower_path_is_empty_for_a_degenerate_cell() {
        let cell = square_metric(0.1);
        let path = build_lawnmower_path_for_cell(&cell, 0.0, 20.0, 30.0);
        assert!(path.is_empty());
    }

    #[test]
    fn rotated_orientation_still_covers_a_similar_area_to_unrotated() {
        let cell = square_metric(50.0);
        let unrotated = build_lawnmower_path_for_cell(&cell, 0.0, 10.0, 15.0);
        let rotated = build_lawnmower_path_for_cell(&cell, 90.0, 10.0, 15.0);
        assert!(!unrotated.is_empty());
        assert!(!rotated.is_empty());
        let _ = cell.unsigned_area();
    }
}
