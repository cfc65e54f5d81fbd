use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::domain::{PositionUpdate, RequestId, RequestStatus, VehiclePosition};
use crate::logs::LogEntry;

// ============================================================================
// Request Ledger Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SolveQuery {
    pub action: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub request_id: RequestId,
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionStatusResponse {
    pub request_id: String,
    pub status: RequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<Value>,
}

// ============================================================================
// Fleet Config Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfirmResponse {
    pub success: bool,
    pub message: String,
    pub vehicles: Vec<String>,
}

// ============================================================================
// Agent Status Types
// ============================================================================

/// Body of `POST /api/agents/status`; fields are checked by the handler so a
/// missing one yields the documented 400 rather than a decode rejection
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentStatusUpdate {
    pub agent_name: Option<String>,
    pub agent_type: Option<String>,
    pub status: Option<String>,
    #[serde(default)]
    pub info: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentUpdateResponse {
    pub success: bool,
    pub agent: String,
}

// ============================================================================
// Telemetry Types
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MovementUpdate {
    pub vehicle_name: Option<String>,
    #[serde(flatten)]
    pub position: PositionUpdate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementUpdateResponse {
    pub success: bool,
    pub vehicle: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllPositionsResponse {
    pub vehicles: BTreeMap<String, VehiclePosition>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionResponse {
    pub vehicle: String,
    pub position: VehiclePosition,
}

// ============================================================================
// Log Types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LogListEntry {
    pub name: String,
    pub log_file: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogListResponse {
    pub agents: Vec<LogListEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AgentLogResponse {
    pub agent_name: String,
    pub log_file: String,
    pub content: String,
    pub size: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntriesResponse {
    pub agent_name: String,
    pub entries: Vec<LogEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LatestLogsResponse {
    pub agents: Vec<String>,
    pub folder: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogFoldersResponse {
    pub folders: Vec<String>,
}

// ============================================================================
// System Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: i64,
    pub pending_requests: usize,
}

