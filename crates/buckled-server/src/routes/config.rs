//! Collaborator configuration routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use buckled_core::Error;
use buckled_extract::{ExtractionConfigResponse, ExtractionConfigUpdate};

use super::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/config", get(get_config).put(update_config))
        .route("/config/test", post(test_connection))
}

/// GET /api/config: the API key is reported only as configured or not.
async fn get_config(State(state): State<Arc<AppState>>) -> Json<ExtractionConfigResponse> {
    Json(state.extraction_config.read().to_response())
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(update): Json<ExtractionConfigUpdate>,
) -> ApiResult<ExtractionConfigResponse> {
    let updated = {
        let mut config = state.extraction_config.write();
        config.apply_update(&update);
        config
            .save()
            .map_err(|e| Error::Storage(format!("Failed to save config: {}", e)))?;
        config.clone()
    };
    state.rebuild_client(&updated)?;
    Ok(Json(updated.to_response()))
}

/// POST /api/config/test: one minimal prompt through the rate limiter.
async fn test_connection(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let success = state.client().test_connection().await;
    Json(serde_json::json!({ "success": success }))
}
