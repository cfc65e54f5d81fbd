use axum::{extract::State, Json};

use crate::api::{state::AppState, types::*};

/// GET /health -- lightweight liveness probe
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let counts = state.store.request_counts().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.uptime_seconds(),
        pending_requests: counts.pending,
    })
}
