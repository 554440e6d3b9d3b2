use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::path::Path;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::error;

/// Stream a store artifact with cache headers. Immutable artifacts (cached
/// thumbnails) get a one-year lifetime, everything else a day.
pub async fn serve_file(path: &Path, content_type: &str, immutable: bool) -> Response {
    let file = match File::open(path).await {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open file: {:?}, error: {}", path, e);
            return StatusCode::NOT_FOUND.into_response();
        }
    };

    let metadata = match file.metadata().await {
        Ok(m) => m,
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(metadata.len()));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(if immutable {
            "public, max-age=31536000, immutable"
        } else {
            "public, max-age=86400"
        }),
    );
    if let Ok(modified) = metadata.modified()
        && let Ok(value) = HeaderValue::from_str(&httpdate::fmt_http_date(modified))
    {
        headers.insert(header::LAST_MODIFIED, value);
    }

    let body = Body::from_stream(ReaderStream::new(file));
    (StatusCode::OK, headers, body).into_response()
}
