use axum::{
    Form, Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::AppState;
use crate::ingest::IngestError;
use crate::repository::{Comment, RepositoryError};
use crate::store::formats::SUPPORTED_EXTENSIONS;
use crate::store::{
    ContentKey, ContentStore, StoreError, ThumbnailSource, Variant, serve_file,
};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(what) => {
                (StatusCode::NOT_FOUND, format!("Not found: {}", what)).into_response()
            }
            ApiError::BadRequest(reason) => (StatusCode::BAD_REQUEST, reason).into_response(),
            ApiError::Internal(detail) => {
                error!("Request failed: {}", detail);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<IngestError> for ApiError {
    fn from(e: IngestError) -> Self {
        if e.is_bad_input() {
            ApiError::BadRequest(e.to_string())
        } else {
            ApiError::Internal(e.to_string())
        }
    }
}

pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid image id: {}", raw)))
}

fn parse_key(raw: &str) -> Result<ContentKey, ApiError> {
    raw.parse::<ContentKey>()
        .map_err(|_| ApiError::BadRequest(format!("Invalid image hash: {}", raw)))
}

#[derive(Serialize)]
pub struct LikesResponse {
    likes: i64,
}

#[derive(Serialize)]
pub struct SharesResponse {
    shares: i64,
}

#[derive(Serialize)]
pub struct CommentsResponse {
    comments: Vec<Comment>,
}

#[derive(Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

pub async fn like_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<LikesResponse>, ApiError> {
    let id = parse_id(&id)?;
    let likes = app_state
        .repository
        .increment_likes(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("image {}", id)))?;
    Ok(Json(LikesResponse { likes }))
}

pub async fn share_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SharesResponse>, ApiError> {
    let id = parse_id(&id)?;
    let shares = app_state
        .repository
        .increment_shares(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("image {}", id)))?;
    Ok(Json(SharesResponse { shares }))
}

pub async fn comment_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Result<Json<CommentsResponse>, ApiError> {
    let id = parse_id(&id)?;
    let text = form.text.trim();
    if text.is_empty() {
        return Err(ApiError::BadRequest("Comment text is required".to_string()));
    }

    let comments = app_state
        .repository
        .append_comment(id, Comment::new(text))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("image {}", id)))?;
    Ok(Json(CommentsResponse { comments }))
}

/// Deletes the metadata row. Artifacts stay on disk unless
/// `storage.cascade_delete` is set.
pub async fn delete_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    let Some(record) = app_state.repository.get(id).await? else {
        return Err(ApiError::NotFound(format!("image {}", id)));
    };

    if !app_state.repository.delete(id).await? {
        return Err(ApiError::NotFound(format!("image {}", id)));
    }
    info!(id, hash = %record.hash, "Deleted image record");

    if app_state.config.storage.cascade_delete {
        match app_state.store.remove(record.hash) {
            Ok(removed) => info!(hash = %record.hash, "Removed {} artifact(s)", removed),
            Err(e) => warn!(hash = %record.hash, "Failed to remove artifacts: {}", e),
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

pub async fn thumbnail_handler(
    State(app_state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<Response, ApiError> {
    let key = parse_key(&hash)?;
    let images = &app_state.config.images;

    let thumbnail = app_state
        .store
        .thumbnail(key, images.thumbnail_width, images.jpeg_quality)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("thumbnail {}", key)))?;

    let immutable = thumbnail.source != ThumbnailSource::Original;
    Ok(serve_file(&thumbnail.path, &thumbnail.content_type(), immutable).await)
}

/// Raw artifact by file name, e.g. `/out/1234.out.jpg`.
pub async fn artifact_handler(
    State(app_state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Response, ApiError> {
    if !is_artifact_name(&file) {
        return Err(ApiError::NotFound(file));
    }

    let path = app_state.store.root().join(&file);
    if !path.is_file() {
        return Err(ApiError::NotFound(file));
    }

    let content_type = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .to_string();
    Ok(serve_file(&path, &content_type, false).await)
}

/// `<key>.<in|out>.<ext>` or `<key>.thumb.jpg`, with the key in canonical
/// decimal form.
fn is_artifact_name(file: &str) -> bool {
    let mut parts = file.split('.');
    let (Some(key), Some(variant), Some(ext), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    let Ok(parsed) = key.parse::<ContentKey>() else {
        return false;
    };
    let variant = match variant {
        "in" => Variant::Original,
        "out" => Variant::Output,
        "thumb" => Variant::Thumbnail,
        _ => return false,
    };

    SUPPORTED_EXTENSIONS.contains(&ext) && ContentStore::file_name(parsed, variant, ext) == file
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_names() {
        assert!(is_artifact_name("1234.out.jpg"));
        assert!(is_artifact_name("1234.in.png"));
        assert!(is_artifact_name("1234.thumb.jpg"));
        assert!(!is_artifact_name("1234.thumb.png"));
        assert!(!is_artifact_name("../etc/passwd"));
        assert!(!is_artifact_name("..%2F1234.out.jpg"));
        assert!(!is_artifact_name(".upload_abc"));
        assert!(!is_artifact_name("1234.out.exe"));
        assert!(!is_artifact_name("+12.out.jpg"));
        assert!(!is_artifact_name("012.out.jpg"));
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id(" 42 ").unwrap(), 42);
        assert!(matches!(parse_id("abc"), Err(ApiError::BadRequest(_))));
    }
}
