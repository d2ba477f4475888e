//! Backup routes: export, import and clearing all data.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{delete, get, post};
use axum::{Json, Router};

use buckled_store::{ExportBundle, ImportBundle, ImportSummary};

use super::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/data/export", get(export_data))
        .route("/data/import", post(import_data))
        .route("/data", delete(clear_data))
}

/// GET /api/data/export: every collection, soft-deleted profiles included.
async fn export_data(State(state): State<Arc<AppState>>) -> ApiResult<ExportBundle> {
    Ok(Json(state.store.export_all()?))
}

/// POST /api/data/import: upsert records; malformed ones are skipped.
async fn import_data(
    State(state): State<Arc<AppState>>,
    Json(bundle): Json<ImportBundle>,
) -> ApiResult<ImportSummary> {
    Ok(Json(state.store.import_bundle(bundle)?))
}

async fn clear_data(State(state): State<Arc<AppState>>) -> ApiResult<serde_json::Value> {
    state.store.clear_all()?;
    Ok(Json(serde_json::json!({ "success": true })))
}
