//! Extraction routes: typed descriptions, uploaded documents and a
//! normalization preview.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use buckled_context::ProcessOutcome;
use buckled_core::ExtractedServiceData;
use buckled_extract::{normalize, Normalized, UploadedDocument};

use super::{ApiError, ApiResult};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/extract/text", post(extract_text))
        .route("/extract/document", post(extract_document))
        .route("/normalize", post(normalize_preview))
}

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub input: String,
}

/// The new record plus everything derived from it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResponse {
    pub extraction: ExtractedServiceData,
    #[serde(flatten)]
    pub outcome: ProcessOutcome,
}

/// POST /api/extract/text
async fn extract_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TextRequest>,
) -> ApiResult<ExtractionResponse> {
    let input = req.input.trim();
    if input.is_empty() {
        return Err(ApiError::bad_request("Input text is required"));
    }

    let session = state.store.get_user_session().ok();
    let extraction = state.client().extract_from_text(input, session.as_ref()).await;
    let outcome = state.context.process_extraction(&extraction);
    info!(
        "Text extraction {} -> {}",
        extraction.id, extraction.service_info.primary_service
    );

    Ok(Json(ExtractionResponse { extraction, outcome }))
}

/// POST /api/extract/document: the first file field of a multipart body.
async fn extract_document(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<ExtractionResponse> {
    let mut document = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let mime_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;
        document = Some(UploadedDocument::new(file_name, mime_type, bytes.to_vec()));
        break;
    }
    let document = document.ok_or_else(|| ApiError::bad_request("No file uploaded"))?;

    let session = state.store.get_user_session().ok();
    let extraction = state
        .client()
        .extract_from_document(&document, session.as_ref())
        .await?;
    keep_upload(&state, &document);
    let outcome = state.context.process_extraction(&extraction);

    Ok(Json(ExtractionResponse { extraction, outcome }))
}

/// Keep a copy of an accepted upload under its content hash.
fn keep_upload(state: &AppState, document: &UploadedDocument) {
    let ext = std::path::Path::new(&document.file_name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let path = state
        .config
        .data_paths
        .uploads
        .join(format!("{}.{}", document.content_hash(), ext.to_lowercase()));
    if path.exists() {
        return;
    }
    if let Err(e) = std::fs::write(&path, &document.bytes) {
        warn!("Failed to keep upload {}: {}", document.file_name, e);
    }
}

/// POST /api/normalize: what the normalizer makes of the input, without a
/// collaborator call.
async fn normalize_preview(Json(req): Json<TextRequest>) -> Json<Normalized> {
    Json(normalize(&req.input))
}
