use axum::{
    extract::State,
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
use crate::domain::VehicleFleetConfig;

/// POST /api/vehicles/confirm
pub async fn confirm_vehicles(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> ApiResult<Json<FleetConfirmResponse>> {
    let Some(Json(body)) = body else {
        return Err(ApiError::bad_request("Invalid request - vehicles required"));
    };

    let config = VehicleFleetConfig::parse(body)?;
    let vehicles = config.vehicle_names();
    state.store.set_fleet_config(config).await;

    Ok(Json(FleetConfirmResponse {
        success: true,
        message: format!("{} vehicles confirmed", vehicles.len()),
        vehicles,
    }))
}

/// GET /api/vehicles/poll-config
pub async fn poll_vehicle_config(State(state): State<AppState>) -> Response {
    match state.store.take_fleet_config().await {
        Some(delivery) => Json(delivery).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
