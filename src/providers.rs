//! External capability interfaces: `ElevationProvider`, `WeatherProvider`,
//! `NoFlyProvider`. The core depends only on these traits; any HTTP- or
//! DEM-file-backed implementation is supplied by the out-of-scope
//! orchestrator, grounded on `core/terrain.py::get_elevation`,
//! `core/utils.py::get_weather`, `core/nofly.py::load_real_nofly_zones`,
//! which describe the failure-mode behavior these traits must preserve:
//! on provider failure, substitute a safe default and continue.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::{Point, Polygon};

/// A single weather observation (`WeatherUpdate` payload).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temp: f32,
    pub wind_speed: f32,
    pub wind_deg: f32,
    pub humidity: f32,
    pub description: String,
    pub visibility: f32,
}

/// Elevation above the ellipsoid, meters. `0.0` on failure is a documented,
/// accepted degradation, not an error.
#[async_trait]
pub trait ElevationProvider: Send + Sync {
    async fn elevation(&self, lat: f64, lon: f64) -> f32;
}

/// `None` on failure; the planner substitutes the last known wind snapshot.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn at(&self, lat: f64, lon: f64) -> Option<WeatherSnapshot>;
}

/// Used only to populate `PlanRequest` inputs ahead of a call to
/// `Planner::plan`; never called from the core pipeline itself.
#[async_trait]
pub trait NoFlyProvider: Send + Sync {
    async fn fetch(&self, bbox: (f64, f64, f64, f64)) -> Vec<Polygon>;
}

/// Constant-elevation test double. `table` allows a handful of known points
/// to be overridden for fixtures that need varied terrain; everything else
/// falls back to `default_m`.
#[cfg(any(test, feature = "test-support"))]
pub struct StaticElevationProvider {
    pub default_m: f32,
    pub table: Vec<(Point, f32)>,
}

#[cfg(any(test, feature = "test-support"))]
impl StaticElevationProvider {
    pub fn flat(default_m: f32) -> Self {
        Self {
            default_m,
            table: Vec::new(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl ElevationProvider for StaticElevationProvider {
    async fn elevation(&self, lat: f64, lon: f64) -> f32 {
        const TOL: f64 = 1e-6;
        self.table
            .iter()
            .find(|(p, _)| (p.lat - lat).abs() < TOL && (p.lon - lon).abs() < TOL)
            .map(|(_, h)| *h)
            .unwrap_or(self.default_m)
    }
}

/// Constant-wind test double.
#[cfg(any(test, feature = "test-support"))]
pub struct FixedWeatherProvider {
    pub snapshot: WeatherSnapshot,
}

#[cfg(any(test, feature = "test-support"))]
impl FixedWeatherProvider {
    pub fn calm() -> Self {
        Self {
            snapshot: WeatherSnapshot {
                temp: 20.0,
                wind_speed: 0.0,
                wind_deg: 0.0,
                humidity: 50.0,
                description: "calm".to_string(),
                visibility: 10_000.0,
            },
        }
    }

    pub fn with_wind(wind_speed: f32, wind_deg: f32) -> Self {
        Self {
            snapshot: WeatherSnapshot {
                wind_speed,
                wind_deg,
                ..Self::calm().snapshot
            },
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl WeatherProvider for FixedWeatherProvider {
    async fn at(&self, _lat: f64, _lon: f64) -> Option<WeatherSnapshot> {
        Some(self.snapshot.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_elevation_provider_falls_back_to_default() {
        let p = StaticElevationProvider::flat(42.0);
        assert_eq!(p.elevation(1.0, 2.0).await, 42.0);
    }

    #[tokio::test]
    async fn static_elevation_provider_honors_table_overrides() {
        let mut p = StaticElevationProvider::flat(0.0);
        p.table.push((Point::new(50.45, 30.52), 123.0));
        assert_eq!(p.elevation(50.45, 30.52).await, 123.0);
        assert_eq!(p.elevation(1.0, 2.0).await, 0.0);
    }

    #[tokio::test]
    async fn fixed_weather_provider_always_returns_its_snapshot() {
        let p = FixedWeatherProvider::with_wind(5.0, 90.0);
        let s = p.at(0.0, 0.0).await.unwrap();
        assert_eq!(s.wind_speed, 5.0);
        assert_eq!(s.wind_deg, 90.0);
    }
}
