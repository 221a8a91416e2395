//! Planner orchestration, ported end-to-end from
//! `core/mission_logic.py::handle_start`, including the job-id cancellation
//! check and the wind-version snapshot behavior.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{instrument, warn};

use crate::aco::{aco_orienteering, AcoInput, AcoParams};
use crate::cache::{Cache, ElevationKey};
use crate::clip::clip_linestring_to_polygon;
use crate::config::PlanRequest;
use crate::discretize::discretize_area;
use crate::energy::leg_energy_wh;
use crate::error::{PlannerError, Result};
use crate::events::{EventSink, GraphEdgeView, GridCellView, PlannerEvent};
use crate::geo_primitives::planar_distance_km;
use crate::lawnmower::build_lawnmower_path_for_cell;
use crate::nofly::NoFlyIndex;
use crate::providers::{ElevationProvider, WeatherProvider};
use crate::stitch::stitch_cell_paths;
use crate::types::Point;
use crate::wind::WindState;

/// Final result of a completed plan, mirroring the `Done` event payload
/// plus the coverage route the orchestrator may persist (a single last-plan
/// slot, out of scope for this crate to own).
#[derive(Debug, Clone)]
pub struct PlanResult {
    pub logical_route: Vec<Point>,
    pub mission_len_km: f64,
    pub coverage_route: Vec<Point>,
    pub coverage_len_km: f64,
    pub energy_wh: f32,
}

/// Per-job cancellation token. A new `job_id` invalidates
/// any in-flight plan; the planner checks `job_id == current` at the sink and
/// aborts after emitting no further events on mismatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobId(pub u64);

/// Drives the mission-planning pipeline end to end.
pub struct Planner<E, W> {
    elevation: Arc<E>,
    weather: Arc<W>,
    elevation_cache: Cache<ElevationKey, f32>,
    wind: Arc<WindState>,
    rng_seed: u64,
}

impl<E: ElevationProvider, W: WeatherProvider> Planner<E, W> {
    pub fn new(elevation: Arc<E>, weather: Arc<W>, wind: Arc<WindState>, rng_seed: u64) -> Self {
        Self {
            elevation,
            weather,
            elevation_cache: Cache::new(crate::cache::DEFAULT_CAPACITY),
            wind,
            rng_seed,
        }
    }

    async fn elevation_at(&self, p: Point) -> f32 {
        let key = ElevationKey::new(p.lat, p.lon);
        if let Some(v) = self.elevation_cache.get(&key) {
            return v;
        }
        let v = self.elevation.elevation(p.lat, p.lon).await;
        self.elevation_cache.put(key, v);
        v
    }

    /// Runs one plan. `job_id` is checked against `current_job_id` before
    /// any event that isn't already queued; a mismatch aborts silently,
    /// cooperatively, with no partial state persisted.
    #[instrument(skip(self, request, sink, current_job_id))]
    pub async fn plan(
        &self,
        request: &PlanRequest,
        job_id: JobId,
        current_job_id: &std::sync::atomic::AtomicU64,
        sink: &mut impl EventSink,
    ) -> Result<PlanResult> {
        if request.ants == 0 {
            return Err(PlannerError::ZeroAnts(request.ants));
        }
        if request.iters == 0 {
            return Err(PlannerError::ZeroIterations(request.iters));
        }
        if !request.drone.battery_wh.is_finite() || request.drone.battery_wh < 0.0 {
            return Err(PlannerError::InvalidBudget(request.drone.battery_wh));
        }
        let refresh_fraction_valid = request.refresh_fraction > 0.0 && request.refresh_fraction <= 1.0;
        if request.dynamic_weather && !refresh_fraction_valid {
            return Err(PlannerError::InvalidRefreshFraction(request.refresh_fraction));
        }

        let config = crate::config::PlannerConfig::default();
        let base = request.base;

        let weather = self.weather.at(base.lat, base.lon).await;
        let wind_snapshot = self.wind.snapshot();
        if let Some(w) = &weather {
            self.wind.update(w.wind_speed as f64, w.wind_deg as f64);
            sink.emit(PlannerEvent::WeatherUpdate(*w)).await;
        }
        let wind = self.wind.snapshot();
        let _ = wind_snapshot;

        if current_job_id.load(Ordering::Acquire) != job_id.0 {
            return Ok(trivial_result(base));
        }

        let area = match &request.area_poly {
            Some(a) if a.len() >= 3 => a.clone(),
            _ => {
                sink.emit(PlannerEvent::AcoError {
                    message: "area polygon missing or degenerate".to_string(),
                })
                .await;
                return Ok(trivial_result(base));
            }
        };

        let discretized = discretize_area(
            &area,
            &request.nofly,
            &request.drone,
            request.grid_type,
            request.cell_size_km,
            config.lambda_turn_km,
        );

        if discretized.cells.is_empty() {
            sink.emit(PlannerEvent::AcoError {
                message: "discretization empty".to_string(),
            })
            .await;
            return Ok(trivial_result(base));
        }

        let fp = crate::footprint::compute_footprint(&request.drone, request.cell_size_km);

        let mut cells = discretized.cells;
        for cell in cells.iter_mut() {
            cell.sweep_path =
                build_lawnmower_path_for_cell(&cell.geom_metric, cell.orientation_deg, fp.delta_perp, fp.w);
        }

        if current_job_id.load(Ordering::Acquire) != job_id.0 {
            return Ok(trivial_result(base));
        }

        let graph_edges: Vec<GraphEdgeView> = discretized
            .graph
            .edge_indices()
            .filter_map(|e| {
                let (a, b) = discretized.graph.edge_endpoints(e)?;
                let na = discretized.graph.node_weight(a)?;
                let nb = discretized.graph.node_weight(b)?;
                let attrs = discretized.graph.edge_weight(e)?;
                let from = crate::geo_primitives::to_geo(crate::types::MetricPoint::new(na.centroid_x, na.centroid_y));
                let to = crate::geo_primitives::to_geo(crate::types::MetricPoint::new(nb.centroid_x, nb.centroid_y));
                Some(GraphEdgeView::new(from, to, attrs))
            })
            .collect();

        sink.emit(PlannerEvent::Grid {
            cells: cells
                .iter()
                .map(|c| GridCellView {
                    idx: c.index,
                    center: c.centroid_geo,
                    bbox: c.bbox_geo,
                    path: c.sweep_path.clone(),
                    orientation: c.orientation_deg,
                })
                .collect(),
            graph_edges: graph_edges.clone(),
        })
        .await;

        let points: Vec<Point> = std::iter::once(base).chain(cells.iter().map(|c| c.centroid_geo)).collect();
        let weights: Vec<f32> = std::iter::once(0.0).chain(cells.iter().map(|c| c.reward)).collect();
        let base_idx = 0usize;

        let mut heights = Vec::with_capacity(points.len());
        for p in &points {
            heights.push(self.elevation_at(*p).await);
        }

        let speed_kmh = request.drone.speed_kmh as f64;
        let payload_kg = request.drone.payload_kg as f64;
        let wind_speed_ms = wind.speed_ms;
        let wind_from_deg = wind.from_deg;

        // Wind is an explicit argument rather than baked into the closure so
        // the ACO loop can re-snapshot `WindState` at dynamic-refresh points
        // and recompute energy with live wind.
        let energy_fn = |i: usize, j: usize, wind_speed_ms: f64, wind_from_deg: f64| {
            leg_energy_wh(points[i], points[j], heights[i], heights[j], speed_kmh, wind_speed_ms, wind_from_deg, payload_kg)
        };
        let energy_back_fn = |i: usize, wind_speed_ms: f64, wind_from_deg: f64| {
            leg_energy_wh(points[i], points[base_idx], heights[i], heights[base_idx], speed_kmh, wind_speed_ms, wind_from_deg, payload_kg)
        };

        let usable_energy_wh = request.drone.battery_wh * (100.0 - request.drone.reserve_pct).max(0.0) / 100.0;

        let nofly = NoFlyIndex::build(&request.nofly);
        let input = AcoInput {
            points: &points,
            weights: &weights,
            base_idx,
            nofly: &nofly,
            clip_polygon: Some(&area),
        };
        let params = AcoParams {
            energy_budget_wh: usable_energy_wh,
            reserve_wh: usable_energy_wh * 0.1,
            ants: request.ants,
            iterations: request.iters,
            dynamic_weather: request.dynamic_weather,
            refresh_interval: request.refresh_interval,
            refresh_mode: request.refresh_mode,
            refresh_fraction: request.refresh_fraction,
            initial_wind_speed_ms: wind_speed_ms,
            initial_wind_from_deg: wind_from_deg,
            wind_state: if request.dynamic_weather { Some(self.wind.clone()) } else { None },
        };

        let mut rng = StdRng::seed_from_u64(self.rng_seed);

        let (order, _best_score, best_cost) =
            aco_orienteering(input, &params, &config, energy_fn, energy_back_fn, &mut rng, sink).await;

        if current_job_id.load(Ordering::Acquire) != job_id.0 {
            return Ok(trivial_result(base));
        }

        if order.is_empty() {
            sink.emit(PlannerEvent::AcoError {
                message: "route not found".to_string(),
            })
            .await;
            return Ok(trivial_result(base));
        }

        let visit_cells: Vec<usize> = order[1..order.len().saturating_sub(1)]
            .iter()
            .filter(|&&i| i > 0)
            .map(|&i| (i - 1) as usize)
            .collect();

        let mut logical_route = vec![base];
        for &ci in &visit_cells {
            logical_route.push(cells[ci].centroid_geo);
        }
        logical_route.push(base);

        // `clip_polygon` is applied to the logical (centroid) tour only.
        logical_route = clip_logical_route(&logical_route, &area);

        let logical_km: f64 = logical_route.windows(2).map(|w| planar_distance_km(w[0], w[1])).sum();

        let battery_km = usable_energy_wh as f64 * config.km_per_wh as f64;
        let reserve_km = battery_km * config.stitch_reserve_fraction as f64;

        let coverage_route = stitch_cell_paths(&cells, &visit_cells, base, reserve_km, battery_km);
        let coverage_km: f64 = coverage_route.windows(2).map(|w| planar_distance_km(w[0], w[1])).sum();

        sink.emit(PlannerEvent::Done {
            route: logical_route.clone(),
            mission_len_km: logical_km,
            graph_edges,
        })
        .await;

        Ok(PlanResult {
            logical_route,
            mission_len_km: logical_km,
            coverage_route,
            coverage_len_km: coverage_km,
            energy_wh: best_cost,
        })
    }
}

/// Clips the logical route to the area polygon, falling back to the
/// unclipped route on an empty result (fail-open on a geometry exception),
/// matching `handle_start`'s `if clipped_route: ... else: use unclipped`.
fn clip_logical_route(route: &[Point], area: &crate::types::Polygon) -> Vec<Point> {
    if route.len() < 2 {
        return route.to_vec();
    }
    let ring: Vec<geo::Coord<f64>> = area.iter().map(|p| geo::Coord { x: p.lon, y: p.lat }).collect();
    let poly = geo::Polygon::new(geo::LineString::from(ring), vec![]);
    let line: Vec<geo::Coord<f64>> = route.iter().map(|p| geo::Coord { x: p.lon, y: p.lat }).collect();
    let clipped = clip_linestring_to_polygon(&line, &poly).into_polylines().concat();
    if clipped.is_empty() {
        warn!("logical route clipped to empty; using unclipped route");
        route.to_vec()
    } else {
        clipped
    }
}

fn trivial_result(base: Point) -> PlanResult {
    PlanResult {
        logical_route: vec![base, base],
        mission_len_km: 0.0,
        coverage_route: vec![base, base],
        coverage_len_km: 0.0,
        energy_wh: 0.0,
    }
}
