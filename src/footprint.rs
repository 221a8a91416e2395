//! Sensor footprint and grid center generation, ported from
//! `core/discretization.py::compute_sensor_footprint`,
//! `regular_grid_centers`, `hex_grid_centers`, `square_cell`, `hex_cell`.

use geo::{Coord, LineString, Polygon as GeoPolygon};

use crate::config::{DroneSpec, GridType};

/// Swath width, perpendicular/parallel lane spacing, and inward/outward
/// buffer distance, all in meters.
#[derive(Debug, Clone, Copy)]
pub struct Footprint {
    pub w: f64,
    pub delta_perp: f64,
    pub delta_par: f64,
    pub buffer: f64,
}

/// `W = 2h*tan(theta/2)`; `DeltaPerp` from the nominal cell size if given,
/// else `W*(1 - o_perp)`; `DeltaPar = W*(1 - o_par)`; `buffer = 0.5*W*o_perp`.
pub fn compute_footprint(drone: &DroneSpec, cell_size_km: f32) -> Footprint {
    let theta_rad = (drone.fov_deg as f64).to_radians();
    let w = 2.0 * drone.altitude_m as f64 * (theta_rad / 2.0).tan();

    let delta_perp = if cell_size_km > 0.0 {
        cell_size_km as f64 * 1000.0
    } else {
        w * (1.0 - drone.overlap_perp as f64)
    };
    let delta_par = w * (1.0 - drone.overlap_par as f64);
    let buffer = 0.5 * w * drone.overlap_perp as f64;

    Footprint {
        w,
        delta_perp,
        delta_par,
        buffer,
    }
}

/// Regular lattice of grid centers over a metric bounding box, step
/// `(dx, dy)`, for the square grid type.
pub fn regular_grid_centers(bbox: (f64, f64, f64, f64), dx: f64, dy: f64) -> Vec<(f64, f64)> {
    let (minx, miny, maxx, maxy) = bbox;
    if dx <= 0.0 || dy <= 0.0 {
        return Vec::new();
    }

    let mut centers = Vec::new();
    let mut x = minx;
    while x <= maxx + 0.5 * dx {
        let mut y = miny;
        while y <= maxy + 0.5 * dy {
            centers.push((x, y));
            y += dy;
        }
        x += dx;
    }
    centers
}

/// Hex lattice: pitch `Δperp`, rows offset by `Δperp/2`, row spacing
/// `(√3/2)·Δperp`.
pub fn hex_grid_centers(bbox: (f64, f64, f64, f64), pitch: f64) -> Vec<(f64, f64)> {
    let (minx, miny, maxx, maxy) = bbox;
    if pitch <= 0.0 {
        return Vec::new();
    }

    let dx = pitch;
    let dy = 3f64.sqrt() * pitch / 2.0;

    let mut centers = Vec::new();
    let mut y = miny;
    let mut row = 0u32;
    while y <= maxy + dy {
        let x_offset = if row % 2 == 0 { 0.0 } else { dx / 2.0 };
        let mut x = minx + x_offset;
        while x <= maxx + dx {
            centers.push((x, y));
            x += dx;
        }
        y += dy;
        row += 1;
    }
    centers
}

/// Axis-aligned square cell of the given side, centered at `center`.
pub fn square_cell(center: (f64, f64), side: f64) -> GeoPolygon<f64> {
    let (cx, cy) = center;
    let half = side / 2.0;
    GeoPolygon::new(
        LineString::from(vec![
            Coord { x: cx - half, y: cy - half },
            Coord { x: cx + half, y: cy - half },
            Coord { x: cx + half, y: cy + half },
            Coord { x: cx - half, y: cy + half },
            Coord { x: cx - half, y: cy - half },
        ]),
        vec![],
    )
}

/// Regular hexagon of the given pitch (flat-to-flat via vertex radius
/// `pitch/2`), centered at `center`, matching `core/discretization.py::hex_cell`.
pub fn hex_cell(center: (f64, f64), pitch: f64) -> GeoPolygon<f64> {
    let (cx, cy) = center;
    let r = pitch / 2.0;
    let mut coords: Vec<Coord<f64>> = (0..6)
        .map(|k| {
            let angle = (60.0 * k as f64 + 30.0).to_radians();
            Coord {
                x: cx + r * angle.cos(),
                y: cy + r * angle.sin(),
            }
        })
        .collect();
    coords.push(coords[0]);
    GeoPolygon::new(LineString::from(coords), vec![])
}

/// Builds the grid centers for the requested grid type over a metric bbox.
pub fn grid_centers(grid_type: GridType, bbox: (f64, f64, f64, f64), fp: &Footprint) -> Vec<(f64, f64)> {
    match grid_type {
        GridType::Square => regular_grid_centers(bbox, fp.delta_perp, fp.delta_par),
        GridType::Hex => hex_grid_centers(bbox, fp.delta_perp),
    }
}

/// Builds the candidate cell polygon at `center` for the requested grid type.
pub fn candidate_cell(grid_type: GridType, center: (f64, f64), fp: &Footprint) -> GeoPolygon<f64> {
    match grid_type {
        GridType::Square => square_cell(center, fp.delta_perp),
        GridType::Hex => hex_cell(center, fp.delta_perp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footprint_matches_closed_form() {
        let mut drone = DroneSpec::default();
        drone.altitude_m = 100.0;
        drone.fov_deg = 60.0;
        drone.overlap_perp = 0.2;
        drone.overlap_par = 0.2;
        let fp = compute_footprint(&drone, 0.0);
        let expected_w = 2.0 * 100.0 * (30f64.to_radians()).tan();
        assert!((fp.w - expected_w).abs() < 1e-9);
        assert!((fp.delta_perp - expected_w * 0.8).abs() < 1e-9);
        assert!((fp.delta_par - expected_w * 0.8).abs() < 1e-9);
    }

    #[test]
    fn nominal_cell_size_overrides_delta_perp() {
        let drone = DroneSpec::default();
        let fp = compute_footprint(&drone, 0.1);
        assert!((fp.delta_perp - 100.0).abs() < 1e-9);
    }

    #[test]
    fn regular_grid_covers_bbox() {
        let centers = regular_grid_centers((0.0, 0.0, 100.0, 100.0), 25.0, 25.0);
        assert!(centers.len() >= 16);
        assert!(centers.iter().all(|&(x, y)| x >= 0.0 && y >= 0.0));
    }

    #[test]
    fn hex_grid_produces_offset_rows() {
        let centers = hex_grid_centers((0.0, 0.0, 100.0, 100.0), 20.0);
        assert!(!centers.is_empty());
    }

    #[test]
    fn square_cell_has_expected_area() {
        let cell = square_cell((0.0, 0.0), 10.0);
        use geo::Area;
        assert!((cell.unsigned_area() - 100.0).abs() < 1e-9);
    }
}
