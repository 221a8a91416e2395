//! No-fly spatial index and segment-intersection check, ported from
//! `core/aco.py::_safe_polygons`, `build_nofly_rtree`, `fast_segment_intersects`.

use geo::{BoundingRect, Intersects, LineString, Polygon as GeoPolygon};
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::types::{Point, Polygon};

/// One obstacle indexed into the R-tree: its geographic polygon plus the
/// AABB rstar needs for indexing, matching the `RTreeIndexObject` shape the
/// `novelt-building-aggregation-tool` example builds around `rstar::RTree`.
#[derive(Debug, Clone)]
struct IndexedObstacle {
    id: usize,
    poly: GeoPolygon<f64>,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedObstacle {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl PointDistance for IndexedObstacle {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let center = self.envelope.center();
        let dx = center[0] - point[0];
        let dy = center[1] - point[1];
        dx * dx + dy * dy
    }

    fn contains_point(&self, point: &[f64; 2]) -> bool {
        self.envelope.contains_point(point)
    }
}

impl PartialEq for IndexedObstacle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

/// Validates raw obstacle rings: non-empty, >= 3 distinct vertices, and
/// buildable into a `geo::Polygon`. Malformed items are rejected silently,
/// matching `_safe_polygons`'s `try/except: continue`.
fn safe_polygons(raw: &[Polygon]) -> Vec<GeoPolygon<f64>> {
    raw.iter()
        .filter(|ring| ring.len() >= 3)
        .filter_map(|ring| {
            let coords: Vec<geo::Coord<f64>> =
                ring.iter().map(|p| geo::Coord { x: p.lon, y: p.lat }).collect();
            let poly = GeoPolygon::new(LineString::from(coords), vec![]);
            if poly.bounding_rect().is_some() {
                Some(poly)
            } else {
                None
            }
        })
        .collect()
}

/// Spatial index over validated obstacle polygons in geographic frame.
/// `None`-equivalent (no obstacles) is represented by an
/// empty index rather than `Option`, since an empty R-tree answers every
/// query with "no intersection" for free.
pub struct NoFlyIndex {
    tree: RTree<IndexedObstacle>,
}

impl NoFlyIndex {
    /// Builds the index from raw obstacle rings.
    pub fn build(raw: &[Polygon]) -> Self {
        let polys = safe_polygons(raw);
        let objects: Vec<IndexedObstacle> = polys
            .into_iter()
            .enumerate()
            .filter_map(|(id, poly)| {
                let bbox = poly.bounding_rect()?;
                Some(IndexedObstacle {
                    id,
                    envelope: AABB::from_corners(
                        [bbox.min().x, bbox.min().y],
                        [bbox.max().x, bbox.max().y],
                    ),
                    poly,
                })
            })
            .collect();

        Self {
            tree: RTree::bulk_load(objects),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// `true` if the geographic segment `p1 -> p2` intersects any indexed
    /// obstacle. Builds a `LineString` in `(lon, lat)` = `(x, y)`
    /// convention to match `geo`'s coordinate order, queries candidates by
    /// envelope, then checks the exact geometry — mirroring
    /// `fast_segment_intersects`'s `rtree.query(seg)` + `seg.intersects(poly)`.
    pub fn intersects(&self, p1: Point, p2: Point) -> bool {
        if self.tree.size() == 0 {
            return false;
        }

        let seg = LineString::from(vec![
            geo::Coord { x: p1.lon, y: p1.lat },
            geo::Coord { x: p2.lon, y: p2.lat },
        ]);
        let seg_bbox = match seg.bounding_rect() {
            Some(b) => b,
            None => return false,
        };
        let query_envelope = AABB::from_corners(
            [seg_bbox.min().x, seg_bbox.min().y],
            [seg_bbox.max().x, seg_bbox.max().y],
        );

        self.tree
            .locate_in_envelope_intersecting(&query_envelope)
            .any(|obj| seg.intersects(&obj.poly))
    }
}
