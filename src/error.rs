use thiserror::Error;

/// Crate-wide result alias, mirroring the `OdinActorError`/`Result<T>` shape
/// used across this codebase's actor and service crates.
pub type Result<T> = std::result::Result<T, PlannerError>;

/// Construction-time errors only. Per the error handling design, faults that
/// occur *during* a plan (bad input geometry, a provider timeout, a geometry
/// exception in clipping) are never propagated as `PlannerError` — they are
/// caught at their boundary and either substituted with a safe default or
/// surfaced as a `PlannerEvent::AcoError`. `PlannerError` exists only for
/// malformed `Planner`/`PlannerConfig` construction, before any event stream
/// has started.
#[derive(Error, Debug, PartialEq)]
pub enum PlannerError {
    #[error("ants must be >= 1, got {0}")]
    ZeroAnts(u32),

    #[error("iterations must be >= 1, got {0}")]
    ZeroIterations(u32),

    #[error("energy budget must be finite and non-negative, got {0}")]
    InvalidBudget(f32),

    #[error("refresh_fraction must be in (0, 1], got {0}")]
    InvalidRefreshFraction(f32),
}
