//! Vehicle profile routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use buckled_core::{SmartInsights, VehicleProfile, VehicleProfileEdit};

use super::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/vehicles", get(list_vehicles))
        .route(
            "/vehicles/{id}",
            get(get_vehicle).put(update_vehicle).delete(delete_vehicle),
        )
        .route("/vehicles/{id}/insights", get(get_insights))
}

/// GET /api/vehicles: active profiles only.
async fn list_vehicles(State(state): State<Arc<AppState>>) -> ApiResult<serde_json::Value> {
    let vehicles = state.store.get_all_vehicle_profiles()?;
    Ok(Json(serde_json::json!({
        "vehicles": vehicles,
        "total": vehicles.len(),
    })))
}

async fn get_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<VehicleProfile> {
    state
        .store
        .get_vehicle_profile(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Vehicle profile {} not found", id)))
}

/// PUT /api/vehicles/{id}: nickname, notes, tags and other user-owned fields.
async fn update_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(edit): Json<VehicleProfileEdit>,
) -> ApiResult<VehicleProfile> {
    Ok(Json(state.store.update_vehicle_profile(&id, &edit)?))
}

async fn delete_vehicle(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    if !state.store.delete_vehicle_profile(&id)? {
        return Err(ApiError::not_found(format!("Vehicle profile {} not found", id)));
    }
    Ok(Json(serde_json::json!({ "success": true, "id": id })))
}

async fn get_insights(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<SmartInsights> {
    state
        .context
        .generate_smart_insights(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No insights for vehicle {}", id)))
}
