//! Core data model shared by every stage of the planner pipeline.
//!
//! `Point` and `MetricPoint` are thin newtypes over `geo_types::Coord<f64>` so
//! the discretizer and lawnmower synthesizer can hand geometry straight to
//! `geo`'s algorithms (`BooleanOps`, `Intersects`, `Area`, `Centroid`, ...)
//! without a conversion step, while keeping the geographic/metric frames
//! distinct at the type level — it is too easy to accidentally feed a
//! lat/lon pair into code that expects meters.

use geo_types::Coord;
use serde::{Deserialize, Serialize};

/// Placeholder used only to satisfy `serde`'s `#[serde(skip)]` default
/// requirement when deserializing a `Cell`; `geom_metric` is never
/// reconstructed from wire data, only produced by the discretizer.
fn empty_geom_metric() -> geo::Polygon<f64> {
    geo::Polygon::new(geo::LineString::new(vec![]), vec![])
}

/// A `(lat, lon)` pair in degrees, WGS84. All geographic I/O uses this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn as_tuple(&self) -> (f64, f64) {
        (self.lat, self.lon)
    }
}

impl From<(f64, f64)> for Point {
    fn from((lat, lon): (f64, f64)) -> Self {
        Point::new(lat, lon)
    }
}

/// A `(x, y)` pair in meters under the equal-area projection. All grid
/// geometry is constructed in this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricPoint {
    pub x: f64,
    pub y: f64,
}

impl MetricPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<MetricPoint> for Coord<f64> {
    fn from(p: MetricPoint) -> Self {
        Coord { x: p.x, y: p.y }
    }
}

impl From<Coord<f64>> for MetricPoint {
    fn from(c: Coord<f64>) -> Self {
        MetricPoint { x: c.x, y: c.y }
    }
}

/// Ordered closed ring of geographic points. Interior rings are ignored for
/// the area of interest.
pub type Polygon = Vec<Point>;

/// An elemental survey tile produced by the discretizer. Built once by
/// `discretize::discretize_area`, immutable thereafter, then enriched with a
/// sweep path by `lawnmower::build_lawnmower_path_for_cell`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub index: u32,
    #[serde(skip, default = "empty_geom_metric")]
    pub geom_metric: geo::Polygon<f64>,
    pub centroid_metric: (f64, f64),
    pub centroid_geo: Point,
    /// (min_lat, min_lon, max_lat, max_lon)
    pub bbox_geo: (f64, f64, f64, f64),
    /// Preferred sweep azimuth in `[0, 180)` degrees.
    pub orientation_deg: f32,
    /// Snake-ordered lawnmower path, geographic frame.
    pub sweep_path: Vec<Point>,
    /// Default 1.0; may be overridden by a priority map.
    pub reward: f32,
}

/// `Vec<u32>` of cell indices (1-based into `points`, 0 is always base),
/// starting and ending at `base_idx`. Interior elements are distinct.
pub type Tour = Vec<u32>;

/// A dense, row-major, symmetric `n x n` matrix of `f32`, used for both the
/// energy matrix (Wh) and the distance surrogate matrix. Kept as a flat
/// `Vec<f32>` rather than `Vec<Vec<f32>>` so the ACO inner loop's lookups are
/// allocation-free after precomputation.
#[derive(Debug, Clone)]
pub struct Matrix {
    n: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(n: usize) -> Self {
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.data[i * self.n + j]
    }

    /// Sets `[i][j]` and `[j][i]` to the same value, keeping the matrix
    /// symmetric by construction.
    #[inline]
    pub fn set_symmetric(&mut self, i: usize, j: usize, value: f32) {
        self.data[i * self.n + j] = value;
        self.data[j * self.n + i] = value;
    }
}

/// Result of clipping a polyline against a polygon: zero, one, or several
/// disjoint runs of points. Models the `LineString | MultiLineString` sum
/// type that `shapely`'s `line.intersection(poly)` can return, per the
/// "Dynamic dispatch over geometry types" design note.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipResult {
    Empty,
    Line(Vec<Point>),
    Multi(Vec<Vec<Point>>),
}

impl ClipResult {
    /// Folds any variant into a flat list of polylines, per the design note's
    /// instruction to "fold to `Vec<Polyline>` uniformly".
    pub fn into_polylines(self) -> Vec<Vec<Point>> {
        match self {
            ClipResult::Empty => vec![],
            ClipResult::Line(l) => vec![l],
            ClipResult::Multi(ls) => ls,
        }
    }
}
