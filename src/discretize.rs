//! Boustrophedon decomposition, orientation assignment, and adjacency graph
//! construction, plus the top-level `discretize_area` entry point mirroring
//! `core/discretization.py::discretize_area`.

use geo::{Area, Centroid, Coord, Intersects, LineString, Polygon as GeoPolygon};
use petgraph::graph::{NodeIndex, UnGraph};
use std::collections::HashMap;

use crate::clip::{
    contains_or_on_boundary, difference_from_obstacles, intersect_keep_largest, largest_polygon,
    offset_polygon,
};
use crate::config::{DroneSpec, GridType};
use crate::footprint::{candidate_cell, compute_footprint, grid_centers};
use crate::geo_primitives::to_metric;
use crate::types::{Cell, Point, Polygon};

/// Node payload: the cell's metric centroid, used by `build_adjacency_graph`
/// and exposed to callers that want to render the graph.
#[derive(Debug, Clone, Copy)]
pub struct CentroidNode {
    pub cell_index: u32,
    pub centroid_x: f64,
    pub centroid_y: f64,
}

/// Edge payload.
#[derive(Debug, Clone, Copy)]
pub struct EdgeAttrs {
    pub dist_km: f64,
    pub turn_deg: f64,
    pub weight: f64,
}

pub type CentroidGraph = UnGraph<CentroidNode, EdgeAttrs>;

fn ring_to_geo_polygon(ring: &Polygon, project: impl Fn(Point) -> Coord<f64>) -> GeoPolygon<f64> {
    let coords: Vec<Coord<f64>> = ring.iter().map(|&p| project(p)).collect();
    GeoPolygon::new(LineString::from(coords), vec![])
}

/// Converts a geographic ring to its metric-frame polygon.
pub fn project_polygon_to_metric(ring: &Polygon) -> GeoPolygon<f64> {
    ring_to_geo_polygon(ring, |p| to_metric(p).into())
}

/// Generates `n_strips` long thin rectangles sweeping `free_space` at
/// `sweep_angle_deg` and intersects each with it, collecting the resulting
/// pieces as subareas. Falls back to `[free_space]` if no strip
/// yields a non-empty piece.
pub fn boustrophedon_decompose(
    free_space: &GeoPolygon<f64>,
    sweep_angle_deg: f64,
) -> Vec<GeoPolygon<f64>> {
    use geo::BoundingRect;

    let bbox = match free_space.bounding_rect() {
        Some(b) => b,
        None => return vec![],
    };
    let (minx, miny) = (bbox.min().x, bbox.min().y);
    let (maxx, maxy) = (bbox.max().x, bbox.max().y);
    let span_x = maxx - minx;
    let span_y = maxy - miny;
    let approx = span_x.max(span_y);
    let min_span = span_x.min(span_y).max(1e-6);
    let n_strips = (4usize).max(((approx / min_span) as usize) * 4);

    let angle_rad = sweep_angle_deg.to_radians();
    let (dx, dy) = (angle_rad.cos(), angle_rad.sin());
    let length = (span_x.powi(2) + span_y.powi(2)).sqrt() * 2.0;
    let half_width = approx / n_strips as f64;

    let mut subareas = Vec::new();
    for i in 0..n_strips {
        let t = i as f64 / (n_strips - 1).max(1) as f64;
        let ox = minx + t * span_x;
        let oy = miny;

        // Strip approximated as a thin rectangle along the sweep direction,
        // `half_width` either side, standing in for shapely's `line.buffer(w)`.
        let perp = (-dy, dx);
        let p1 = (ox - dx * length, oy - dy * length);
        let p2 = (ox + dx * length, oy + dy * length);
        let strip = GeoPolygon::new(
            LineString::from(vec![
                Coord { x: p1.0 + perp.0 * half_width, y: p1.1 + perp.1 * half_width },
                Coord { x: p2.0 + perp.0 * half_width, y: p2.1 + perp.1 * half_width },
                Coord { x: p2.0 - perp.0 * half_width, y: p2.1 - perp.1 * half_width },
                Coord { x: p1.0 - perp.0 * half_width, y: p1.1 - perp.1 * half_width },
                Coord { x: p1.0 + perp.0 * half_width, y: p1.1 + perp.1 * half_width },
            ]),
            vec![],
        );

        if let Some(piece) = intersect_keep_largest(free_space, &geo_types::MultiPolygon::new(vec![strip])) {
            if piece.unsigned_area() > 0.0 {
                subareas.push(piece);
            }
        }
    }

    if subareas.is_empty() {
        vec![free_space.clone()]
    } else {
        subareas
    }
}

/// `0°` if the cell's bounding-box width >= height, else `90°`.
pub fn assign_orientation_to_cells(cells_m: &[GeoPolygon<f64>]) -> HashMap<usize, f32> {
    use geo::BoundingRect;

    let mut phi_map = HashMap::new();
    for (idx, cell) in cells_m.iter().enumerate() {
        let phi = match cell.bounding_rect() {
            Some(b) => {
                let dx = b.width();
                let dy = b.height();
                if dx >= dy {
                    0.0
                } else {
                    90.0
                }
            }
            None => 0.0,
        };
        phi_map.insert(idx, phi);
    }
    phi_map
}

/// Builds the undirected weighted adjacency graph over touching/overlapping
/// cells. `lambda_turn_km` is the turn-penalty coefficient.
pub fn build_adjacency_graph(
    cells_m: &[GeoPolygon<f64>],
    centroids_m: &[(f64, f64)],
    phi_map: &HashMap<usize, f32>,
    lambda_turn_km: f64,
) -> CentroidGraph {
    let mut g = CentroidGraph::new_undirected();
    let mut node_ix: Vec<NodeIndex> = Vec::with_capacity(cells_m.len());

    for (idx, &(cx, cy)) in centroids_m.iter().enumerate() {
        node_ix.push(g.add_node(CentroidNode {
            cell_index: idx as u32,
            centroid_x: cx,
            centroid_y: cy,
        }));
    }

    for i in 0..cells_m.len() {
        for j in (i + 1)..cells_m.len() {
            if !cells_m[i].intersects(&cells_m[j]) {
                continue;
            }

            let (xi, yi) = centroids_m[i];
            let (xj, yj) = centroids_m[j];
            let dist_km = ((xj - xi).powi(2) + (yj - yi).powi(2)).sqrt() / 1000.0;

            let phi_i = *phi_map.get(&i).unwrap_or(&0.0) as f64;
            let phi_j = *phi_map.get(&j).unwrap_or(&0.0) as f64;
            let mut dphi = (phi_i - phi_j).abs() % 180.0;
            if dphi > 90.0 {
                dphi = 180.0 - dphi;
            }

            let weight = dist_km + lambda_turn_km * (dphi / 90.0);

            g.add_edge(
                node_ix[i],
                node_ix[j],
                EdgeAttrs {
                    dist_km,
                    turn_deg: dphi,
                    weight,
                },
            );
        }
    }

    g
}

/// Output of the full discretization pipeline, before lawnmower synthesis.
pub struct DiscretizeResult {
    pub cells: Vec<Cell>,
    pub graph: CentroidGraph,
}

/// Discretizes `area` (minus `obstacles`) into survey cells, assigns sweep
/// orientation, and builds the adjacency graph, mirroring
/// `core/discretization.py::discretize_area`.
pub fn discretize_area(
    area: &Polygon,
    obstacles: &[Polygon],
    drone: &DroneSpec,
    grid_type: GridType,
    cell_size_km: f32,
    lambda_turn_km: f64,
) -> DiscretizeResult {
    let area_m = project_polygon_to_metric(area);
    let obstacles_m: Vec<GeoPolygon<f64>> = obstacles.iter().map(project_polygon_to_metric).collect();

    let fp = compute_footprint(drone, cell_size_km);

    let mut area_inner = offset_polygon(&area_m, -fp.buffer);
    if area_inner.unsigned_area() <= 0.0 {
        area_inner = area_m.clone();
    }
    let obstacles_buf: Vec<GeoPolygon<f64>> = obstacles_m
        .iter()
        .map(|o| offset_polygon(o, fp.buffer))
        .collect();

    let free_space_multi = difference_from_obstacles(&area_inner, &obstacles_buf);
    let free_space = match largest_polygon(&free_space_multi) {
        Some(p) => p,
        None => {
            return DiscretizeResult {
                cells: vec![],
                graph: CentroidGraph::new_undirected(),
            }
        }
    };

    use geo::BoundingRect;
    let bbox = match free_space.bounding_rect() {
        Some(b) => (b.min().x, b.min().y, b.max().x, b.max().y),
        None => {
            return DiscretizeResult {
                cells: vec![],
                graph: CentroidGraph::new_undirected(),
            }
        }
    };

    let centers = grid_centers(grid_type, bbox, &fp);

    let mut cells_m = Vec::new();
    let mut centroids_m = Vec::new();

    for center in centers {
        let candidate = candidate_cell(grid_type, center, &fp);
        let clipped = match intersect_keep_largest(&candidate, &free_space_multi) {
            Some(c) => c,
            None => continue,
        };
        if clipped.unsigned_area() < drone.min_cell_area_m2 as f64 {
            continue;
        }
        let centroid = match clipped.centroid() {
            Some(c) => c,
            None => continue,
        };
        if !contains_or_on_boundary(&free_space, centroid.0) {
            continue;
        }

        centroids_m.push((centroid.0.x, centroid.0.y));
        cells_m.push(clipped);
    }

    if cells_m.is_empty() {
        return DiscretizeResult {
            cells: vec![],
            graph: CentroidGraph::new_undirected(),
        };
    }

    let subareas = boustrophedon_decompose(&area_inner, 0.0);
    let _ = &subareas; // orientation policy below uses bbox only; the per-subarea policy is a possible stronger alternative
    let phi_map = assign_orientation_to_cells(&cells_m);

    let graph = build_adjacency_graph(&cells_m, &centroids_m, &phi_map, lambda_turn_km);

    let cells = cells_m
        .iter()
        .zip(centroids_m.iter())
        .enumerate()
        .map(|(idx, (geom, &(cx, cy)))| {
            use crate::geo_primitives::to_geo;
            use crate::types::MetricPoint;

            let centroid_geo = to_geo(MetricPoint::new(cx, cy));
            let bbox = geom.bounding_rect().expect("non-empty cell has a bbox");
            let bbox_min_geo = to_geo(MetricPoint::new(bbox.min().x, bbox.min().y));
            let bbox_max_geo = to_geo(MetricPoint::new(bbox.max().x, bbox.max().y));

            Cell {
                index: idx as u32,
                geom_metric: geom.clone(),
                centroid_metric: (cx, cy),
                centroid_geo,
                bbox_geo: (
                    bbox_min_geo.lat.min(bbox_max_geo.lat),
                    bbox_min_geo.lon.min(bbox_max_geo.lon),
                    bbox_min_geo.lat.max(bbox_max_geo.lat),
                    bbox_min_geo.lon.max(bbox_max_geo.lon),
                ),
                orientation_deg: *phi_map.get(&idx).unwrap_or(&0.0),
                sweep_path: Vec::new(),
                reward: 1.0,
            }
        })
        .collect();

    DiscretizeResult { cells, graph }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_ring(cx: f64, cy: f64, half: f64) -> Polygon {
        vec![
            Point::new(cy - half, cx - half),
            Point::new(cy - half, cx + half),
            Point::new(cy + half, cx + half),
            Point::new(cy + half, cx - half),
            Point::new(cy - half, cx - half),
        ]
    }

    #[test]
    fn discretize_area_produces_at_least_one_cell() {
        // ~200m square around (50.45, 30.52).
        let half_deg_lat = 0.0009;
        let half_deg_lon = 0.0014;
        let area = vec![
            Point::new(50.45 - half_deg_lat, 30.52 - half_deg_lon),
            Point::new(50.45 - half_deg_lat, 30.52 + half_deg_lon),
            Point::new(50.45 + half_deg_lat, 30.52 + half_deg_lon),
            Point::new(50.45 + half_deg_lat, 30.52 - half_deg_lon),
            Point::new(50.45 - half_deg_lat, 30.52 - half_deg_lon),
        ];
        let drone = DroneSpec::default();
        let result = discretize_area(&area, &[], &drone, GridType::Square, 0.1, 0.05);
        assert!(!result.cells.is_empty());
        for c in &result.cells {
            assert!((0.0..180.0).contains(&c.orientation_deg));
        }
    }

    #[test]
    fn adjacency_graph_turn_deg_is_bounded() {
        let cells_m = vec![
            ring_to_geo_polygon(&square_ring(0.0, 0.0, 5.0), |p| Coord { x: p.lon, y: p.lat }),
            ring_to_geo_polygon(&square_ring(10.0, 0.0, 5.0), |p| Coord { x: p.lon, y: p.lat }),
        ];
        let centroids = vec![(0.0, 0.0), (10.0, 0.0)];
        let mut phi_map = HashMap::new();
        phi_map.insert(0, 0.0);
        phi_map.insert(1, 90.0);
        let g = build_adjacency_graph(&cells_m, &centroids, &phi_map, 0.05);
        for e in g.edge_weights() {
            assert!(e.turn_deg >= 0.0 && e.turn_deg <= 90.0);
        }
    }
}
