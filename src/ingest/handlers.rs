use axum::{
    Json,
    extract::{Multipart, State},
    http::header,
    response::{IntoResponse, Redirect},
};

use super::{IngestReport, UploadRequest};
use crate::AppState;
use crate::api::ApiError;

pub async fn upload_handler(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<IngestReport>, ApiError> {
    let request = UploadRequest::from_multipart(multipart).await?;
    Ok(Json(app_state.ingestor.ingest(request).await?))
}

/// Browser form variant: ingest, then send the user to the workspace view.
pub async fn form_handler(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let request = UploadRequest::from_multipart(multipart).await?;
    let report = app_state.ingestor.ingest(request).await?;
    Ok(Redirect::to(&format!("/w/{}", report.workspace_id)))
}

pub async fn preview_handler(
    State(app_state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let request = UploadRequest::from_multipart(multipart).await?;
    let bytes = app_state.ingestor.preview(request).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "image/jpeg"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        bytes,
    ))
}
