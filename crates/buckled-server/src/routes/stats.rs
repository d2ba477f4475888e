//! Spending statistics and dashboard counters.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use tracing::warn;

use buckled_store::{QuickStats, ServiceStats};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/stats/quick", get(get_quick_stats))
}

/// GET /api/stats: zeroed stats if the store cannot be read.
async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ServiceStats> {
    Json(state.store.service_stats().unwrap_or_else(|e| {
        warn!("Service stats unavailable: {}", e);
        ServiceStats::default()
    }))
}

async fn get_quick_stats(State(state): State<Arc<AppState>>) -> Json<QuickStats> {
    Json(state.store.quick_stats(Utc::now()).unwrap_or_else(|e| {
        warn!("Quick stats unavailable: {}", e);
        QuickStats::default()
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::routes::test_support::app;

    #[tokio::test]
    async fn test_stats_after_extractions() {
        let app = app(
            r#"{"serviceInfo": {"primaryService": "Engine Diagnostic", "urgencyLevel": "emergency", "confidence": 70}}"#,
        );
        let (status, empty) = app.send(Method::GET, "/api/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(empty["totalServices"], 0);

        for input in ["engine light flashing", "car shaking badly"] {
            app.send(Method::POST, "/api/extract/text", Some(json!({"input": input})))
                .await;
        }

        let (_, stats) = app.send(Method::GET, "/api/stats", None).await;
        assert_eq!(stats["totalServices"], 2);
        assert_eq!(stats["topServices"][0]["service"], "Engine Diagnostic");
        assert_eq!(stats["topServices"][0]["count"], 2);

        let (_, quick) = app.send(Method::GET, "/api/stats/quick", None).await;
        assert_eq!(quick["recentServices"], 2);
        assert_eq!(quick["pendingActions"], 2);
        assert_eq!(quick["vehicles"], 0);
    }
}
