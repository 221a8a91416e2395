//! ACO orienteering solver, ported near-literally from
//! `core/aco.py::aco_orienteering`, `_two_opt`, `_precompute_energy_matrix`,
//! `_precompute_dist_matrix`, replacing Python's global `random` module with
//! an explicit `rand::rngs::StdRng` threaded through for deterministic
//! reproduction, and `emit(...)`/`socketio.sleep(0)` with
//! `EventSink::emit(...).await` / `tokio::task::yield_now().await`.

use std::sync::Arc;

use rand::Rng;

use crate::clip::clip_linestring_to_polygon;
use crate::config::{PlannerConfig, RefreshMode};
use crate::events::{EventSink, PlannerEvent};
use crate::nofly::NoFlyIndex;
use crate::types::{Matrix, Point, Polygon, Tour};
use crate::wind::WindState;

const Q_PHEROMONE_EPS: f32 = 1e-9;
const HEURISTIC_EPS: f64 = 1e-12;

/// Inputs that do not change across iterations.
pub struct AcoInput<'a> {
    pub points: &'a [Point],
    pub weights: &'a [f32],
    pub base_idx: usize,
    pub nofly: &'a NoFlyIndex,
    pub clip_polygon: Option<&'a Polygon>,
}

/// Per-plan ACO run parameters (`PlanRequest` ACO/weather fields).
pub struct AcoParams {
    pub energy_budget_wh: f32,
    pub reserve_wh: f32,
    pub ants: u32,
    pub iterations: u32,
    pub dynamic_weather: bool,
    pub refresh_interval: u32,
    pub refresh_mode: RefreshMode,
    pub refresh_fraction: f32,
    /// Wind snapshotted at plan start; used for every energy
    /// computation except at a dynamic-refresh point.
    pub initial_wind_speed_ms: f64,
    pub initial_wind_from_deg: f64,
    /// Present only when `dynamic_weather` is enabled; re-snapshotted at
    /// each refresh point and never consulted otherwise (the version is
    /// snapshotted at plan start unless dynamic-refresh is enabled).
    pub wind_state: Option<Arc<WindState>>,
}

/// Precomputes the symmetric energy matrix in Wh, clamped `> 0`.
pub fn precompute_energy_matrix(
    n: usize,
    energy_fn: &dyn Fn(usize, usize, f64, f64) -> f32,
    wind_speed_ms: f64,
    wind_from_deg: f64,
) -> Matrix {
    let mut e = Matrix::zeros(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let v = energy_fn(i, j, wind_speed_ms, wind_from_deg).max(1e-6);
            e.set_symmetric(i, j, v);
        }
    }
    e
}

/// Precomputes the raw lat/lon Euclidean distance surrogate.
/// Preserved unchanged rather than guessing at an unstated intent.
pub fn precompute_dist_matrix(points: &[Point]) -> Matrix {
    let n = points.len();
    let mut d = Matrix::zeros(n);
    for i in 0..n {
        for j in (i + 1)..n {
            let dlat = points[i].lat - points[j].lat;
            let dlon = points[i].lon - points[j].lon;
            d.set_symmetric(i, j, ((dlat * dlat + dlon * dlon).sqrt()) as f32);
        }
    }
    d
}

fn route_cost(tour: &[usize], e: &Matrix) -> f32 {
    if tour.len() < 2 {
        return 0.0;
    }
    tour.windows(2).map(|w| e.get(w[0], w[1])).sum()
}

#[allow(clippy::too_many_arguments)]
fn feasible(
    cur: usize,
    nxt: usize,
    used: f32,
    points: &[Point],
    e: &Matrix,
    nofly: &NoFlyIndex,
    energy_back_fn: &dyn Fn(usize, f64, f64) -> f32,
    wind_speed_ms: f64,
    wind_from_deg: f64,
    eff_budget: f32,
) -> bool {
    if nofly.intersects(points[cur], points[nxt]) {
        return false;
    }
    let c = e.get(cur, nxt);
    let back = energy_back_fn(nxt, wind_speed_ms, wind_from_deg);
    if c <= 0.0 || back <= 0.0 {
        return false;
    }
    used + c + back <= eff_budget
}

/// First-improvement 2-opt with full-pass restart: any accepted improvement
/// restarts the outer scan rather than finishing the current pass. Yields
/// once per full pass to stay cooperative.
async fn two_opt(tour: Vec<usize>, e: &Matrix, eff_budget: f32) -> (Vec<usize>, f32) {
    if tour.len() <= 4 {
        let cost = route_cost(&tour, e);
        return (tour, cost);
    }

    let mut best = tour;
    let mut best_cost = route_cost(&best, e);

    let mut improved = true;
    while improved {
        improved = false;
        'outer: for i in 1..(best.len() - 2) {
            for j in (i + 2)..(best.len() - 1) {
                let mut cand = best.clone();
                cand[i..j].reverse();
                let c = route_cost(&cand, e);
                if c < best_cost && c <= eff_budget {
                    best = cand;
                    best_cost = c;
                    improved = true;
                    break 'outer;
                }
            }
        }
        tokio::task::yield_now().await;
    }

    (best, best_cost)
}

/// Clips tour coordinates to the area polygon for an `AcoIter`/`Done`
/// payload, folding `Empty | Line | Multi` uniformly. Falls
/// back to the unclipped coordinates on an empty clip result, matching
/// `_clip_route_to_polygon`'s `if clipped.is_empty: return coords` branch
/// only for the "no polygon supplied" case — an empty *clip* (route left
/// the area entirely) legitimately yields no points.
fn clip_tour_coords(coords: Vec<Point>, clip_polygon: Option<&Polygon>) -> Vec<Point> {
    let poly = match clip_polygon {
        Some(p) if p.len() >= 3 => p,
        _ => return coords,
    };
    if coords.len() < 2 {
        return coords;
    }
    let ring: Vec<geo::Coord<f64>> = poly.iter().map(|p| geo::Coord { x: p.lon, y: p.lat }).collect();
    let geo_poly = geo::Polygon::new(geo::LineString::from(ring), vec![]);
    let line: Vec<geo::Coord<f64>> = coords.iter().map(|p| geo::Coord { x: p.lon, y: p.lat }).collect();
    clip_linestring_to_polygon(&line, &geo_poly).into_polylines().concat()
}

fn greedy_fallback(
    input: &AcoInput,
    e: &Matrix,
    energy_back_fn: &dyn Fn(usize, f64, f64) -> f32,
    wind_speed_ms: f64,
    wind_from_deg: f64,
    eff_budget: f32,
) -> (Tour, f32, f32) {
    let n = input.points.len();
    let base_idx = input.base_idx;

    let mut order: Vec<usize> = (0..n).filter(|&i| i != base_idx).collect();
    order.sort_by(|&a, &b| input.weights[b].partial_cmp(&input.weights[a]).unwrap());

    let mut tour = vec![base_idx];
    let mut cur = base_idx;
    let mut used = 0.0f32;
    let mut score = 0.0f32;

    for j in order {
        let c = e.get(cur, j);
        let back = energy_back_fn(j, wind_speed_ms, wind_from_deg);
        if used + c + back > eff_budget {
            continue;
        }
        used += c;
        score += input.weights[j];
        tour.push(j);
        cur = j;
    }

    used += energy_back_fn(cur, wind_speed_ms, wind_from_deg);
    tour.push(base_idx);

    (tour.into_iter().map(|i| i as u32).collect(), score, used)
}

/// Runs the ACO orienteering solver. Returns `(best_tour, best_score,
/// best_cost)`. `energy_fn`/`energy_back_fn` are synchronous and take the
/// wind to use for that call explicitly — by the time this is called,
/// elevations are already memoized, so no provider I/O happens inside
/// the solver loop; only the wind value passed in varies, and only at
/// dynamic-refresh points.
#[allow(clippy::too_many_arguments)]
pub async fn aco_orienteering<S: EventSink>(
    input: AcoInput<'_>,
    params: &AcoParams,
    config: &PlannerConfig,
    energy_fn: impl Fn(usize, usize, f64, f64) -> f32,
    energy_back_fn: impl Fn(usize, f64, f64) -> f32,
    rng: &mut impl Rng,
    sink: &mut S,
) -> (Tour, f32, f32) {
    let n = input.points.len();
    if n == 0 {
        return (vec![], 0.0, 0.0);
    }

    let (budget, reserve) = if params.energy_budget_wh <= 0.0 {
        (1e12_f32, 0.0_f32)
    } else {
        (params.energy_budget_wh, params.reserve_wh)
    };
    let eff_budget = (budget - reserve).max(0.0);

    let mut wind_speed_ms = params.initial_wind_speed_ms;
    let mut wind_from_deg = params.initial_wind_from_deg;

    let mut e = precompute_energy_matrix(n, &energy_fn, wind_speed_ms, wind_from_deg);
    let d = precompute_dist_matrix(input.points);

    let mut tau = vec![0.0f32; n * n];
    for t in tau.iter_mut() {
        *t = 1.0 + rng.gen::<f32>() * 0.02;
    }
    let tau_idx = |i: usize, j: usize| i * n + j;

    let mut g_best_tour: Vec<usize> = vec![input.base_idx, input.base_idx];
    let mut g_best_score = 0.0f32;
    let mut g_best_cost = 1e12f32;

    for it in 0..params.iterations {
        if params.dynamic_weather && it > 0 && params.refresh_interval > 0 && it % params.refresh_interval == 0 {
            // Re-snapshot the live wind state only at a refresh point: the
            // version is snapshotted at plan start and used for the
            // entire plan unless dynamic-refresh is enabled.
            if let Some(wind_state) = &params.wind_state {
                let snap = wind_state.snapshot();
                wind_speed_ms = snap.speed_ms;
                wind_from_deg = snap.from_deg;
                sink.emit(PlannerEvent::WeatherDynamic {
                    wind_speed: wind_speed_ms as f32,
                    wind_deg: wind_from_deg as f32,
                })
                .await;
            }

            match params.refresh_mode {
                RefreshMode::Full => {
                    e = precompute_energy_matrix(n, &energy_fn, wind_speed_ms, wind_from_deg);
                    for t in tau.iter_mut() {
                        *t *= 0.9;
                    }
                }
                RefreshMode::Partial => {
                    let edges = ((params.refresh_fraction as f64 * (n * n) as f64).ceil() as usize).max(1);
                    for _ in 0..edges {
                        let i = rng.gen_range(0..n);
                        let j = rng.gen_range(0..n);
                        if i != j {
                            let v = energy_fn(i, j, wind_speed_ms, wind_from_deg).max(1e-6);
                            e.set_symmetric(i, j, v);
                        }
                    }
                    for t in tau.iter_mut() {
                        *t *= 0.95;
                    }
                }
            }
        }

        let mut i_best_tour: Option<Vec<usize>> = None;
        let mut i_best_score = -1.0f32;
        let mut i_best_cost = 1e12f32;

        for _ant in 0..params.ants {
            let mut visited = vec![false; n];
            visited[input.base_idx] = true;

            let mut cur = input.base_idx;
            let mut used = 0.0f32;
            let mut score = 0.0f32;
            let mut tour = vec![input.base_idx];

            loop {
                let candidates: Vec<usize> = (0..n)
                    .filter(|&j| {
                        j != input.base_idx
                            && !visited[j]
                            && feasible(
                                cur,
                                j,
                                used,
                                input.points,
                                &e,
                                input.nofly,
                                &energy_back_fn,
                                wind_speed_ms,
                                wind_from_deg,
                                eff_budget,
                            )
                    })
                    .collect();

                if candidates.is_empty() {
                    break;
                }

                let vals: Vec<(usize, f64)> = candidates
                    .iter()
                    .map(|&j| {
                        let eta = 1.0 / (d.get(cur, j) as f64 + HEURISTIC_EPS).powf(config.beta as f64);
                        let val = (tau[tau_idx(cur, j)] as f64).powf(config.alpha as f64) * eta;
                        (j, val)
                    })
                    .collect();
                let sum: f64 = vals.iter().map(|(_, v)| v).sum();

                if sum <= 0.0 {
                    break;
                }

                let chosen = if rng.gen::<f32>() < config.q0 {
                    vals.iter()
                        .copied()
                        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
                        .map(|(j, _)| j)
                        .unwrap()
                } else {
                    let r = rng.gen::<f64>() * sum;
                    let mut acc = 0.0;
                    let mut pick = candidates[candidates.len() - 1];
                    for &(j, v) in &vals {
                        acc += v;
                        if acc >= r {
                            pick = j;
                            break;
                        }
                    }
                    pick
                };

                used += e.get(cur, chosen);
                score += input.weights[chosen];
                visited[chosen] = true;
                tour.push(chosen);
                cur = chosen;
            }

            used += energy_back_fn(cur, wind_speed_ms, wind_from_deg);
            tour.push(input.base_idx);

            if used <= eff_budget
                && (score > i_best_score || (score == i_best_score && used < i_best_cost))
            {
                i_best_tour = Some(tour);
                i_best_score = score;
                i_best_cost = used;
            }
        }

        let mut i_best_tour = match i_best_tour {
            Some(t) => t,
            None => {
                tokio::task::yield_now().await;
                continue;
            }
        };

        let (opt_tour, opt_cost) = two_opt(i_best_tour, &e, eff_budget).await;
        i_best_tour = opt_tour;
        i_best_cost = opt_cost;

        if i_best_score > g_best_score || (i_best_score == g_best_score && i_best_cost < g_best_cost) {
            g_best_score = i_best_score;
            g_best_cost = i_best_cost;
            g_best_tour = i_best_tour.clone();
        }

        for t in tau.iter_mut() {
            *t *= 1.0 - config.rho;
        }
        let delta = config.q / (i_best_cost + Q_PHEROMONE_EPS);
        for w in i_best_tour.windows(2) {
            let (u, v) = (w[0], w[1]);
            tau[tau_idx(u, v)] += delta;
            tau[tau_idx(v, u)] += delta;
        }

        let coords_best = clip_tour_coords(g_best_tour.iter().map(|&i| input.points[i]).collect(), input.clip_polygon);
        let coords_iter = clip_tour_coords(i_best_tour.iter().map(|&i| input.points[i]).collect(), input.clip_polygon);

        sink.emit(PlannerEvent::AcoIter {
            iteration: it + 1,
            iter_score: i_best_score,
            iter_cost: i_best_cost,
            iter_tour: coords_iter,
            best_score: g_best_score,
            best_cost: g_best_cost,
            best_tour: coords_best,
        })
        .await;

        tokio::task::yield_now().await;
    }

    if g_best_score <= 0.0 || g_best_tour.len() <= 2 {
        let (tour, score, cost) =
            greedy_fallback(&input, &e, &energy_back_fn, wind_speed_ms, wind_from_deg, eff_budget);
        return (tour, score, cost);
    }

    (
        g_best_tour.into_iter().map(|i| i as u32).collect(),
        g_best_score,
        g_best_cost,
    )
}
