//! Agent log endpoints and the log-derived fleet views.
//!
//! File reads are blocking and may be large, so every handler here moves
//! its work onto the blocking pool. None of them touch the coordination store.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::api::{
    error::{ApiError, ApiResult},
    state::AppState,
    types::*,
};
use crate::error::{BrokerError, Result};
use crate::logs::{
    parse_entries, AgentLogFile, CommunicationView, LogDirectory, MovementView, SystemStateView,
};

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub run: Option<String>,
}

fn task_failed(e: tokio::task::JoinError) -> ApiError {
    ApiError::from(BrokerError::Internal(format!("log task failed: {}", e)))
}

async fn blocking<T, F>(work: F) -> ApiResult<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(task_failed)?
        .map_err(ApiError::from)
}

/// Locate an agent log or build the 404 body listing what does exist
fn locate(
    logs: &LogDirectory,
    run: Option<&str>,
    agent: &str,
) -> std::result::Result<AgentLogFile, ApiError> {
    if let Some(file) = logs.find_agent(run, agent)? {
        return Ok(file);
    }

    let searched_file = LogDirectory::file_name_for(agent)?;
    let available_files: Vec<String> = logs
        .list_agents(run)?
        .into_iter()
        .map(|a| a.log_file)
        .collect();

    Err(
        ApiError::not_found(format!("Log file not found for agent: {}", agent))
            .with("searched_file", searched_file)
            .with("available_files", available_files)
            .with(
                "message",
                "Log file may not exist yet. Agents create log files when they start processing requests.",
            ),
    )
}

/// GET /log
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> ApiResult<Json<LogListResponse>> {
    let logs = state.logs().clone();
    let files = blocking(move || logs.list_agents(query.run.as_deref())).await?;

    let agents = files
        .into_iter()
        .map(|file| LogListEntry {
            endpoint: format!("/log/{}", file.name),
            name: file.name,
            log_file: file.log_file,
        })
        .collect();
    Ok(Json(LogListResponse { agents }))
}

/// GET /log/:agent (`mra` for the route manager)
pub async fn get_agent_log(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Query(query): Query<LogQuery>,
) -> ApiResult<Json<AgentLogResponse>> {
    let logs = state.logs().clone();

    let (file, content) = tokio::task::spawn_blocking(move || {
        let file = locate(&logs, query.run.as_deref(), &agent)?;
        let content = logs.read(&file).unwrap_or_default();
        Ok::<_, ApiError>((file, content))
    })
    .await
    .map_err(task_failed)??;

    Ok(Json(AgentLogResponse {
        agent_name: file.name,
        log_file: file.log_file,
        size: content.len(),
        content,
    }))
}

/// GET /log/:agent/entries
pub async fn get_agent_entries(
    State(state): State<AppState>,
    Path(agent): Path<String>,
    Query(query): Query<LogQuery>,
) -> ApiResult<Json<LogEntriesResponse>> {
    let logs = state.logs().clone();

    let (file, entries) = tokio::task::spawn_blocking(move || {
        let file = locate(&logs, query.run.as_deref(), &agent)?;
        let entries = logs
            .read(&file)
            .map(|text| parse_entries(&text))
            .unwrap_or_default();
        Ok::<_, ApiError>((file, entries))
    })
    .await
    .map_err(task_failed)??;

    Ok(Json(LogEntriesResponse {
        agent_name: file.name,
        entries,
    }))
}

/// GET /api/latest-logs
pub async fn latest_logs(State(state): State<AppState>) -> ApiResult<Json<LatestLogsResponse>> {
    let logs = state.logs().clone();

    let response = blocking(move || {
        let folder = logs.latest_run();
        let agents = logs
            .list_agents(folder.as_deref())?
            .into_iter()
            .map(|a| a.name)
            .collect();
        Ok(LatestLogsResponse { agents, folder })
    })
    .await?;
    Ok(Json(response))
}

/// GET /api/log-folders
pub async fn log_folders(State(state): State<AppState>) -> ApiResult<Json<LogFoldersResponse>> {
    let logs = state.logs().clone();
    let folders = blocking(move || Ok(logs.list_runs())).await?;
    Ok(Json(LogFoldersResponse { folders }))
}

/// GET /api/da-movements[/:run]
pub async fn da_movements(
    State(state): State<AppState>,
    run: Option<Path<String>>,
) -> ApiResult<Json<MovementView>> {
    let aggregator = state.aggregator.clone();
    let run = run.map(|Path(run)| run);
    let view = blocking(move || aggregator.movement_view(run.as_deref())).await?;
    Ok(Json(view))
}

/// GET /api/agent-communication[/:run]
pub async fn agent_communication(
    State(state): State<AppState>,
    run: Option<Path<String>>,
) -> ApiResult<Json<CommunicationView>> {
    let aggregator = state.aggregator.clone();
    let run = run.map(|Path(run)| run);
    let view = blocking(move || aggregator.communication_view(run.as_deref())).await?;
    Ok(Json(view))
}

/// GET /api/system-state[/:run]
pub async fn system_state(
    State(state): State<AppState>,
    run: Option<Path<String>>,
) -> ApiResult<Json<SystemStateView>> {
    let aggregator = state.aggregator.clone();
    let run = run.map(|Path(run)| run);
    let view = blocking(move || aggregator.system_state(run.as_deref())).await?;
    Ok(Json(view))
}
