use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Request ledger
        .route(
            "/api/solve-cvrp",
            get(handlers::poll_work).post(handlers::submit_or_report),
        )
        .route("/api/solution/:id", get(handlers::get_solution_status))
        // Fleet config mailbox
        .route("/api/vehicles/confirm", post(handlers::confirm_vehicles))
        .route("/api/vehicles/poll-config", get(handlers::poll_vehicle_config))
        // Agent registry
        .route(
            "/api/agents/status",
            get(handlers::list_agent_statuses).post(handlers::update_agent_status),
        )
        // Vehicle telemetry
        .route("/api/movement/update", post(handlers::update_position))
        .route("/api/movement/all", get(handlers::all_positions))
        .route("/api/movement/:vehicle", get(handlers::get_position))
        // Raw agent logs
        .route("/log", get(handlers::list_logs))
        .route("/log/:agent", get(handlers::get_agent_log))
        .route("/log/:agent/entries", get(handlers::get_agent_entries))
        .route("/api/latest-logs", get(handlers::latest_logs))
        .route("/api/log-folders", get(handlers::log_folders))
        // Log-derived fleet views
        .route("/api/da-movements", get(handlers::da_movements))
        .route("/api/da-movements/:run", get(handlers::da_movements))
        .route("/api/agent-communication", get(handlers::agent_communication))
        .route("/api/agent-communication/:run", get(handlers::agent_communication))
        .route("/api/system-state", get(handlers::system_state))
        .route("/api/system-state/:run", get(handlers::system_state))
        // Liveness
        .route("/health", get(handlers::health_handler))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
