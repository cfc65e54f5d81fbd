use axum::{extract::State, Json};

use crate::api::{
    error::{ApiError, ApiResult},
    state::AppState,
    types::*,
};
use crate::domain::{AgentKind, AgentState, AgentStatusSummary};

/// POST /api/agents/status
pub async fn update_agent_status(
    State(state): State<AppState>,
    body: Option<Json<AgentStatusUpdate>>,
) -> ApiResult<Json<AgentUpdateResponse>> {
    let Some(Json(update)) = body else {
        return Err(ApiError::bad_request("No JSON data provided"));
    };

    let (Some(name), Some(kind), Some(status)) =
        (update.agent_name, update.agent_type, update.status)
    else {
        return Err(ApiError::bad_request(
            "agent_name, agent_type, and status required",
        ));
    };

    let kind: AgentKind = kind.parse()?;
    let status: AgentState = status.parse()?;
    let record = state
        .store
        .update_agent_status(&name, kind, status, update.info.unwrap_or_default())?;

    Ok(Json(AgentUpdateResponse {
        success: true,
        agent: record.name,
    }))
}

/// GET /api/agents/status
pub async fn list_agent_statuses(State(state): State<AppState>) -> Json<AgentStatusSummary> {
    Json(state.store.list_agent_statuses())
}
