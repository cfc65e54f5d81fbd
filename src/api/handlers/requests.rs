use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;

use crate::api::{
    error::{ApiError, ApiResult},
    state::AppState,
    types::*,
};
use crate::domain::{ReportOutcome, RequestId, RequestState};

/// POST /api/solve-cvrp
///
/// Without `action` the body is a new routing request; with
/// `action=response` it is a solver reporting back.
pub async fn submit_or_report(
    State(state): State<AppState>,
    Query(query): Query<SolveQuery>,
    body: Option<Json<Value>>,
) -> ApiResult<Response> {
    let Some(Json(body)) = body else {
        return Err(ApiError::bad_request("No JSON data provided"));
    };

    match query.action.as_deref() {
        None => submit(&state, body).await,
        Some("response") => report(&state, body).await,
        Some(other) => Err(ApiError::bad_request(format!("Invalid action: {}", other))),
    }
}

async fn submit(state: &AppState, body: Value) -> ApiResult<Response> {
    let request_id = state.store.submit(body).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitResponse {
            request_id,
            status: "submitted".to_string(),
            message: "Request submitted successfully. Use polling to check for solution."
                .to_string(),
        }),
    )
        .into_response())
}

async fn report(state: &AppState, body: Value) -> ApiResult<Response> {
    let raw_id = body
        .get("request_id")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing request_id"))?;
    let id: RequestId = raw_id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid request_id"))?;

    let outcome = state
        .store
        .report_solution(id, body)
        .await
        .map_err(|_| ApiError::bad_request("Invalid request_id"))?;

    let message = match outcome {
        ReportOutcome::Recorded => "Solution received",
        ReportOutcome::AlreadyCompleted => "Solution already received",
    };
    Ok(Json(ReportResponse {
        status: "success".to_string(),
        message: message.to_string(),
    })
    .into_response())
}

/// GET /api/solve-cvrp?action=poll
pub async fn poll_work(
    State(state): State<AppState>,
    Query(query): Query<SolveQuery>,
) -> ApiResult<Response> {
    match query.action.as_deref().unwrap_or("poll") {
        "poll" => Ok(match state.store.claim_next().await {
            Some(claimed) => Json(claimed).into_response(),
            None => StatusCode::NO_CONTENT.into_response(),
        }),
        other => Err(ApiError::bad_request(format!("Invalid action: {}", other))),
    }
}

/// GET /api/solution/:id
pub async fn get_solution_status(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> ApiResult<Json<SolutionStatusResponse>> {
    let not_found = || ApiError::not_found("Request not found");

    let id: RequestId = request_id.parse().map_err(|_| not_found())?;
    let request_state = state.store.query_status(id).await.ok_or_else(not_found)?;

    let status = request_state.status();
    let solution = match request_state {
        RequestState::Completed { solution } => Some(solution),
        _ => None,
    };

    Ok(Json(SolutionStatusResponse {
        request_id,
        status,
        solution,
    }))
}
