//! Process-wide wind state: snapshotted once at plan start and consulted
//! again only at ACO dynamic-refresh points, unless dynamic refresh is
//! enabled. Shared between `planner` (which owns and updates it) and `aco`
//! (which re-snapshots it at refresh points and emits
//! `PlannerEvent::WeatherDynamic` when the value has moved).

use std::sync::atomic::{AtomicU64, Ordering};

/// A point-in-time read of the wind state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindSnapshot {
    pub speed_ms: f64,
    pub from_deg: f64,
    pub version: u64,
}

/// Shared, version-bumped wind state a `weather_update_backend` input
/// updates out of band.
pub struct WindState {
    speed_bits: AtomicU64,
    from_bits: AtomicU64,
    version: AtomicU64,
}

impl WindState {
    pub fn new(speed_ms: f64, from_deg: f64) -> Self {
        Self {
            speed_bits: AtomicU64::new(speed_ms.to_bits()),
            from_bits: AtomicU64::new(from_deg.to_bits()),
            version: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> WindSnapshot {
        WindSnapshot {
            speed_ms: f64::from_bits(self.speed_bits.load(Ordering::Acquire)),
            from_deg: f64::from_bits(self.from_bits.load(Ordering::Acquire)),
            version: self.version.load(Ordering::Acquire),
        }
    }

    /// Called by the `weather_update_backend` input; bumps the version so a
    /// dynamic-refresh read picks it up at the next refresh point.
    pub fn update(&self, speed_ms: f64, from_deg: f64) {
        self.speed_bits.store(speed_ms.to_bits(), Ordering::Release);
        self.from_bits.store(from_deg.to_bits(), Ordering::Release);
        self.version.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for WindState {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}
