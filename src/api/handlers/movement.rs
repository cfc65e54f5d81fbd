use axum::{
    extract::{Path, State},
    Json,
};

use crate::api::{
    error::{ApiError, ApiResult},
    state::AppState,
    types::*,
};

/// POST /api/movement/update
pub async fn update_position(
    State(state): State<AppState>,
    body: Option<Json<MovementUpdate>>,
) -> ApiResult<Json<MovementUpdateResponse>> {
    let Some(Json(update)) = body else {
        return Err(ApiError::bad_request("No JSON data provided"));
    };
    let vehicle = update
        .vehicle_name
        .ok_or_else(|| ApiError::bad_request("vehicle_name required"))?;

    state.store.update_position(&vehicle, update.position)?;

    Ok(Json(MovementUpdateResponse {
        success: true,
        vehicle: vehicle.trim().to_string(),
    }))
}

/// GET /api/movement/all
pub async fn all_positions(State(state): State<AppState>) -> Json<AllPositionsResponse> {
    Json(AllPositionsResponse {
        vehicles: state.store.all_positions(),
        timestamp: state.store.now(),
    })
}

/// GET /api/movement/:vehicle
pub async fn get_position(
    State(state): State<AppState>,
    Path(vehicle): Path<String>,
) -> ApiResult<Json<PositionResponse>> {
    let position = state
        .store
        .get_position(&vehicle)
        .ok_or_else(|| ApiError::not_found("Vehicle not found"))?;

    Ok(Json(PositionResponse { vehicle, position }))
}
