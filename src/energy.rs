//! Per-leg energy model, ported term-for-term from
//! `core/utils.py::leg_energy_wh_cached` / `energy_per_km_wh` /
//! `wind_along_track_kmh`.

use crate::geo_primitives::{bearing_deg, planar_distance_km};
use crate::types::Point;

/// Energy never drops to exactly zero or below; this is the clamp floor.
pub const EPSILON_WH: f32 = 1e-6;

const BASE_WH_PER_KM_A: f64 = 6.0;
const BASE_WH_PER_KM_B: f64 = 0.06;
const WIND_FACTOR_MIN: f64 = 0.7;
const WIND_FACTOR_MAX: f64 = 1.5;
const CLIMB_WH_PER_M: f64 = 0.12;
const DESCENT_WH_PER_M: f64 = 0.03;

/// Wind component along the flight track, km/h. Headwind is negative.
pub fn wind_along_track_kmh(wind_speed_ms: f64, wind_from_deg: f64, track_deg: f64) -> f64 {
    let wind_to_dir = (wind_from_deg + 180.0) % 360.0;
    let rel = ((wind_to_dir - track_deg + 540.0) % 360.0 - 180.0).to_radians();
    let v_kmh = wind_speed_ms * 3.6;
    v_kmh * rel.cos()
}

/// Base Wh/km at the given ground speed, scaled by wind and payload factors.
pub fn energy_per_km_wh(speed_kmh: f64, wind_along_kmh: f64, payload_kg: f64) -> f64 {
    let base = BASE_WH_PER_KM_A + BASE_WH_PER_KM_B * speed_kmh.powi(2);
    let wind_factor = (1.0 + (-wind_along_kmh) / 200.0).clamp(WIND_FACTOR_MIN, WIND_FACTOR_MAX);
    let payload_factor = 1.0 + 0.03 * payload_kg;
    base * wind_factor * payload_factor
}

/// Total leg energy in Wh between two waypoints with known elevations,
/// speed, wind, and payload. Clamped to `>= EPSILON_WH`.
#[allow(clippy::too_many_arguments)]
pub fn leg_energy_wh(
    p1: Point,
    p2: Point,
    h1: f32,
    h2: f32,
    speed_kmh: f64,
    wind_speed_ms: f64,
    wind_from_deg: f64,
    payload_kg: f64,
) -> f32 {
    let d_km = planar_distance_km(p1, p2);
    if d_km < 1e-6 {
        return 0.0;
    }

    let track = bearing_deg(p1, p2);
    let w_along = wind_along_track_kmh(wind_speed_ms, wind_from_deg, track);
    let horizontal = energy_per_km_wh(speed_kmh, w_along, payload_kg) * d_km;

    let dh = (h2 - h1) as f64;
    let vertical = if dh > 0.0 {
        dh * CLIMB_WH_PER_M
    } else {
        dh.abs() * DESCENT_WH_PER_M
    };

    ((horizontal + vertical) as f32).max(EPSILON_WH)
}
