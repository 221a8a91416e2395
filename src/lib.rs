//! Energy-feasible UAV survey mission planner.
//!
//! Takes a polygonal area of interest, a set of no-fly polygons, a launch
//! base, a sensor/aerodynamic drone model, and live wind, and produces a
//! discretization of the area into survey cells with per-cell sweep paths,
//! an energy-feasible visit order selected by an Ant-Colony Orienteering
//! metaheuristic, and a stitched coverage trajectory that returns to base
//! within battery budget.
//!
//! HTTP/socket transport, persistence, export formatters, map UI, and
//! authentication are external collaborators, not part of this crate: the
//! planner consumes a [`config::PlanRequest`] and emits [`events::PlannerEvent`]s
//! through an [`events::EventSink`]. External data services (elevation DEM,
//! weather, airspace) are consumed through the [`providers::ElevationProvider`]
//! and [`providers::WeatherProvider`] capability traits; their concrete
//! implementations are not specified here.

pub mod aco;
pub mod cache;
pub mod clip;
pub mod config;
pub mod discretize;
pub mod energy;
pub mod error;
pub mod events;
pub mod footprint;
pub mod geo_primitives;
pub mod lawnmower;
pub mod nofly;
pub mod planner;
pub mod providers;
pub mod stitch;
pub mod types;
pub mod wind;

pub use config::{DroneSpec, GridType, PlanRequest, PlannerConfig, RefreshMode};
pub use error::{PlannerError, Result};
pub use events::{EventSink, PlannerEvent, VecSink};
pub use planner::{JobId, PlanResult, Planner};
pub use types::{Cell, MetricPoint, Point, Polygon, Tour};
pub use wind::{WindSnapshot, WindState};
