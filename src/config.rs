//! Request and configuration types.

use serde::{Deserialize, Serialize};

use crate::types::{Point, Polygon};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GridType {
    Square,
    Hex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshMode {
    Full,
    Partial,
}

/// Drone/sensor/aerodynamic model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DroneSpec {
    pub battery_wh: f32,
    pub reserve_pct: f32,
    pub speed_kmh: f32,
    pub payload_kg: f32,
    pub altitude_m: f32,
    pub fov_deg: f32,
    pub overlap_perp: f32,
    pub overlap_par: f32,
    pub min_cell_area_m2: f32,
}

impl Default for DroneSpec {
    fn default() -> Self {
        Self {
            battery_wh: 222.0,
            reserve_pct: 20.0,
            speed_kmh: 40.0,
            payload_kg: 1.5,
            altitude_m: 100.0,
            fov_deg: 60.0,
            overlap_perp: 0.2,
            overlap_par: 0.2,
            min_cell_area_m2: 200.0,
        }
    }
}

/// Input to `Planner::plan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub base: Point,
    pub area_poly: Option<Polygon>,
    pub nofly: Vec<Polygon>,
    pub drone: DroneSpec,
    pub grid_type: GridType,
    pub cell_size_km: f32,
    pub ants: u32,
    pub iters: u32,
    pub dynamic_weather: bool,
    pub refresh_interval: u32,
    pub refresh_mode: RefreshMode,
    pub refresh_fraction: f32,
}

impl Default for PlanRequest {
    fn default() -> Self {
        Self {
            base: Point::new(0.0, 0.0),
            area_poly: None,
            nofly: Vec::new(),
            drone: DroneSpec::default(),
            grid_type: GridType::Square,
            cell_size_km: 0.1,
            ants: 20,
            iters: 20,
            dynamic_weather: false,
            refresh_interval: 5,
            refresh_mode: RefreshMode::Partial,
            refresh_fraction: 0.15,
        }
    }
}

/// ACO hyperparameters and the assorted "magic constants" collected into one
/// serde-deserializable struct rather than scattered literals.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub alpha: f32,
    pub beta: f32,
    pub rho: f32,
    pub q0: f32,
    pub q: f32,
    /// Turn-penalty coefficient (km per 90 degrees of turn) used by the
    /// adjacency graph's edge weight.
    pub lambda_turn_km: f32,
    /// `approx_km_per_wh` — a configuration option, default `0.015`, rather
    /// than a hardcoded magic constant.
    pub km_per_wh: f32,
    /// Fraction of usable energy held back as a landing reserve on top of
    /// the stitcher's own `reserve_pct`-derived budget.
    pub stitch_reserve_fraction: f32,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            beta: 2.0,
            rho: 0.1,
            q0: 0.1,
            q: 1.0,
            lambda_turn_km: 0.05,
            km_per_wh: 0.015,
            stitch_reserve_fraction: 0.1,
        }
    }
}
