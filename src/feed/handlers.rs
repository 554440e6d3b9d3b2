use axum::{
    Json,
    extract::{Path, Query, State},
};
use std::collections::BTreeMap;

use super::{FeedRequest, WorkspaceQuery};
use crate::AppState;
use crate::api::{ApiError, parse_id};
use crate::repository::ImageRecord;

pub async fn list_handler(
    State(app_state): State<AppState>,
    Query(request): Query<FeedRequest>,
) -> Result<Json<Vec<ImageRecord>>, ApiError> {
    Ok(Json(app_state.feed.page(&request).await?))
}

pub async fn record_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImageRecord>, ApiError> {
    let id = parse_id(&id)?;
    app_state
        .feed
        .record(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("image {}", id)))
}

pub async fn tags_handler(
    State(app_state): State<AppState>,
    Query(query): Query<WorkspaceQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    Ok(Json(app_state.feed.tags(query.workspace.as_deref()).await?))
}

pub async fn stats_handler(
    State(app_state): State<AppState>,
) -> Result<Json<BTreeMap<String, i64>>, ApiError> {
    Ok(Json(app_state.feed.stats().await?))
}

pub async fn filters_handler(State(app_state): State<AppState>) -> Json<Vec<String>> {
    Json(app_state.resolver.registry().names())
}
