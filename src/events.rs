//! Event sink capability. The source
//! emits over a global `flask_socketio` socket (`emit("planner_update", ...)`
//! in `core/aco.py` / `core/mission_logic.py`); this crate re-architects that
//! as an `EventSink` trait passed by reference into the planner, removing
//! the hidden global and making the solver testable with an in-memory sink.

use async_trait::async_trait;

use crate::discretize::EdgeAttrs;
use crate::providers::WeatherSnapshot;
use crate::types::Point;

/// One grid cell's externally-visible shape, as emitted in the `Grid` event.
#[derive(Debug, Clone)]
pub struct GridCellView {
    pub idx: u32,
    pub center: Point,
    pub bbox: (f64, f64, f64, f64),
    pub path: Vec<Point>,
    pub orientation: f32,
}

/// One adjacency-graph edge, as emitted in both `Grid` and `Done`.
#[derive(Debug, Clone, Copy)]
pub struct GraphEdgeView {
    pub from: Point,
    pub to: Point,
    pub weight: f64,
}

impl GraphEdgeView {
    pub fn new(from: Point, to: Point, attrs: &EdgeAttrs) -> Self {
        Self { from, to, weight: attrs.weight }
    }
}

/// Tagged event records produced by a plan, in the strict order
/// `WeatherUpdate? -> Grid -> AcoIter*K -> (Done | AcoError)`, with an
/// optional `WeatherDynamic` interleaved during ACO iterations when dynamic
/// weather is enabled.
#[derive(Debug, Clone)]
pub enum PlannerEvent {
    WeatherUpdate(WeatherSnapshot),
    Grid {
        cells: Vec<GridCellView>,
        graph_edges: Vec<GraphEdgeView>,
    },
    AcoIter {
        iteration: u32,
        iter_score: f32,
        iter_cost: f32,
        iter_tour: Vec<Point>,
        best_score: f32,
        best_cost: f32,
        best_tour: Vec<Point>,
    },
    WeatherDynamic {
        wind_speed: f32,
        wind_deg: f32,
    },
    AcoError {
        message: String,
    },
    Done {
        route: Vec<Point>,
        mission_len_km: f64,
        graph_edges: Vec<GraphEdgeView>,
    },
}

/// Suspension point the planner yields through after every ACO iteration
/// and every full 2-opt pass. Implementations on a
/// threaded runtime enqueue on a bounded channel and return; implementations
/// on a cooperative runtime simply `await` the send.
#[async_trait]
pub trait EventSink: Send {
    async fn emit(&mut self, event: PlannerEvent);
}

/// Collects every event in order; used by tests and the end-to-end scenario suite.
#[derive(Debug, Default)]
pub struct VecSink {
    pub events: Vec<PlannerEvent>,
}

#[async_trait]
impl EventSink for VecSink {
    async fn emit(&mut self, event: PlannerEvent) {
        self.events.push(event);
    }
}

/// Wraps a bounded `tokio::sync::mpsc::Sender`, enqueueing events on a
/// bounded channel for a threaded runtime. A full
/// channel backpressures the planner rather than dropping events.
pub struct ChannelSink {
    sender: tokio::sync::mpsc::Sender<PlannerEvent>,
}

impl ChannelSink {
    pub fn new(sender: tokio::sync::mpsc::Sender<PlannerEvent>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn emit(&mut self, event: PlannerEvent) {
        // A closed receiver means the caller has stopped listening; the
        // planner has no recovery action beyond dropping the event
        // (cancellation is cooperative, checked separately at `job_id`).
        let _ = self.sender.send(event).await;
    }
}
