//! Stored extraction routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use buckled_core::ExtractedServiceData;

use super::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/extractions", get(list_extractions))
        .route("/extractions/search", get(search_extractions))
        .route("/extractions/{id}", get(get_extraction).delete(delete_extraction))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

/// GET /api/extractions: newest first.
async fn list_extractions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> ApiResult<serde_json::Value> {
    let mut records = state.store.get_all_extractions()?;
    let total = records.len();
    if let Some(limit) = query.limit {
        records.truncate(limit);
    }
    Ok(Json(serde_json::json!({
        "extractions": records,
        "total": total,
    })))
}

async fn get_extraction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<ExtractedServiceData> {
    state
        .store
        .get_extraction(&id)?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Extraction {} not found", id)))
}

async fn delete_extraction(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<serde_json::Value> {
    if !state.store.delete_extraction(&id)? {
        return Err(ApiError::not_found(format!("Extraction {} not found", id)));
    }
    Ok(Json(serde_json::json!({ "success": true, "id": id })))
}

/// GET /api/extractions/search?q=: case-insensitive match on service names,
/// shop and vehicle.
async fn search_extractions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<serde_json::Value> {
    let results = state.store.search_extractions(&query.q)?;
    Ok(Json(serde_json::json!({
        "results": results,
        "total": results.len(),
        "query": query.q,
    })))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::app;

    const REPLY: &str = r#"{"serviceInfo": {"primaryService": "Battery Replacement", "confidence": 80}}"#;

    #[tokio::test]
    async fn test_list_get_search_delete() {
        let app = app(REPLY);
        let (_, created) = app
            .send(Method::POST, "/api/extract/text", Some(json!({"input": "car won't start, battery dead"})))
            .await;
        let id = created["extraction"]["id"].as_str().unwrap().to_string();

        let (status, list) = app.send(Method::GET, "/api/extractions", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list["total"], 1);

        let (status, one) = app.send(Method::GET, &format!("/api/extractions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["serviceInfo"]["primaryService"], "Battery Replacement");

        let (_, found) = app.send(Method::GET, "/api/extractions/search?q=battery", None).await;
        assert_eq!(found["total"], 1);
        let (_, none) = app.send(Method::GET, "/api/extractions/search?q=transmission", None).await;
        assert_eq!(none["total"], 0);

        let (status, _) = app.send(Method::DELETE, &format!("/api/extractions/{}", id), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = app.send(Method::GET, &format!("/api/extractions/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains(&id));
    }
}
