//! User session routes.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};

use buckled_core::{LocationUpdate, PreferencesUpdate, UserSessionData};

use super::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/session", get(get_session))
        .route("/session/preferences", put(update_preferences))
        .route("/session/location", put(update_location))
}

/// GET /api/session: the stored session, or an unsaved default.
async fn get_session(State(state): State<Arc<AppState>>) -> ApiResult<UserSessionData> {
    Ok(Json(state.store.get_user_session()?))
}

async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Json(update): Json<PreferencesUpdate>,
) -> ApiResult<UserSessionData> {
    Ok(Json(state.store.update_user_preferences(&update)?))
}

/// PUT /api/session/location: 400 on a malformed ZIP code.
async fn update_location(
    State(state): State<Arc<AppState>>,
    Json(update): Json<LocationUpdate>,
) -> ApiResult<UserSessionData> {
    Ok(Json(state.store.update_user_location(&update)?))
}
