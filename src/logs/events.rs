use serde::Serialize;

/// Structured fact recovered from an agent log
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum LogEvent {
    Movement(MovementEvent),
    Queue(QueueEvent),
    RouteLifecycle(RouteLifecycleEvent),
    Communication(CommunicationEvent),
    Progress(ProgressEvent),
}

impl LogEvent {
    pub fn timestamp(&self) -> &str {
        match self {
            LogEvent::Movement(e) => &e.timestamp,
            LogEvent::Queue(e) => &e.timestamp,
            LogEvent::RouteLifecycle(e) => &e.timestamp,
            LogEvent::Communication(e) => &e.timestamp,
            LogEvent::Progress(e) => &e.timestamp,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MovementKind {
    #[serde(rename = "arrival")]
    ArrivalAtCustomer,
    #[serde(rename = "depot")]
    ReturnToDepot,
    #[serde(rename = "route_start")]
    RouteStart,
    #[serde(rename = "moving")]
    Moving,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementEvent {
    pub timestamp: String,
    pub x: f64,
    pub y: f64,
    #[serde(rename = "event")]
    pub kind: MovementKind,
    pub customer: Option<String>,
}

/// What caused a queue size observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueTrigger {
    Enqueued,
    Claimed,
    Drained,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueEvent {
    pub timestamp: String,
    /// `None` when the marker carries no count (a bare claim)
    pub queue_size: Option<u32>,
    pub current_route_id: Option<String>,
    pub trigger: QueueTrigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutePhase {
    Queued,
    Executing,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteLifecycleEvent {
    pub timestamp: String,
    pub route_id: String,
    #[serde(rename = "status")]
    pub phase: RoutePhase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationKind {
    Query,
    RouteAssignment,
    RouteResponse,
}

/// Message marker from the route manager's log; `raw` holds the first line only
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommunicationEvent {
    pub timestamp: String,
    pub direction: Direction,
    #[serde(rename = "type")]
    pub kind: CommunicationKind,
    #[serde(rename = "message")]
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "marker", rename_all = "snake_case")]
pub enum ProgressMarker {
    VehicleQueried { agent: String },
    RouteAssigning,
    UnservedCustomers { count: u32 },
    Solving,
    SolutionFound,
}

/// Route manager progress marker used by the system-state view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEvent {
    pub timestamp: String,
    #[serde(flatten)]
    pub marker: ProgressMarker,
}
