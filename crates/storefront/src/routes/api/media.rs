//! AI image generation and CDN upload endpoints.
//!
//! Thin relays: the browser starts a generation task, polls it, and can keep
//! a finished image by uploading it to the CDN. Each endpoint answers 404
//! when its service is not configured.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::{info, instrument};

use crate::error::{AppError, Result};
use crate::services::cdn::{CdnClient, SignedUpload, UploadedAsset};
use crate::services::media::{GenerationRequest, GenerationTask, MediaClient};
use crate::state::AppState;

/// Upload signature request body.
#[derive(Debug, Default, Deserialize)]
pub struct SignatureRequest {
    pub folder: Option<String>,
    pub public_id: Option<String>,
}

/// Server-side upload request body.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub file_url: String,
    pub public_id: Option<String>,
}

fn media_client(state: &AppState) -> Result<&MediaClient> {
    state
        .media()
        .ok_or_else(|| AppError::NotFound("Image generation is not enabled".to_string()))
}

fn cdn_client(state: &AppState) -> Result<&CdnClient> {
    state
        .cdn()
        .ok_or_else(|| AppError::NotFound("Image uploads are not enabled".to_string()))
}

/// Start a generation task.
///
/// # Errors
///
/// Returns 400 for invalid requests and 500 when the image API fails.
#[instrument(skip_all)]
pub async fn create_generation(
    State(state): State<AppState>,
    Json(request): Json<GenerationRequest>,
) -> Result<impl IntoResponse> {
    let task = media_client(&state)?.create_task(&request).await?;
    info!(task_id = %task.task_id, "Image generation started");
    Ok((StatusCode::ACCEPTED, Json(task)))
}

/// Poll a generation task.
///
/// # Errors
///
/// Returns 400 for malformed task IDs and 500 when the image API fails.
#[instrument(skip(state))]
pub async fn generation_status(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<GenerationTask>> {
    let task = media_client(&state)?.task_status(&task_id).await?;
    if task.status.is_terminal() {
        info!(task_id = %task.task_id, status = ?task.status, images = task.images.len(), "Image generation finished");
    }
    Ok(Json(task))
}

/// Sign a direct browser upload.
///
/// # Errors
///
/// Returns 400 for malformed folders or public IDs.
#[instrument(skip_all)]
pub async fn upload_signature(
    State(state): State<AppState>,
    body: Option<Json<SignatureRequest>>,
) -> Result<Json<SignedUpload>> {
    let Json(request) = body.unwrap_or_default();
    let signed =
        cdn_client(&state)?.sign_upload(request.folder.as_deref(), request.public_id.as_deref())?;
    Ok(Json(signed))
}

/// Upload a remote image, such as a finished generation, to the CDN.
///
/// # Errors
///
/// Returns 400 for invalid URLs and 500 when the CDN rejects the upload.
#[instrument(skip_all)]
pub async fn upload(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadedAsset>> {
    let asset = cdn_client(&state)?
        .upload_remote(&request.file_url, request.public_id.as_deref())
        .await?;
    info!(public_id = %asset.public_id, bytes = asset.bytes, "Image uploaded");
    Ok(Json(asset))
}
