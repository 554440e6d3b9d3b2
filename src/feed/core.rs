use std::collections::BTreeMap;
use tracing::debug;

use super::FeedRequest;
use crate::FeedConfig;
use crate::repository::{ImageRecord, ListQuery, Repository, RepositoryError, SortOrder};

/// Stateless read side of the gallery. Pagination state belongs to the
/// caller: an empty page means the feed is exhausted.
#[derive(Debug, Clone)]
pub struct FeedService {
    repository: Repository,
    config: FeedConfig,
    default_workspace: String,
}

impl FeedService {
    pub fn new(
        repository: Repository,
        config: FeedConfig,
        default_workspace: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            config,
            default_workspace: default_workspace.into(),
        }
    }

    pub fn workspace_or_default(&self, workspace: Option<&str>) -> String {
        workspace
            .map(str::trim)
            .filter(|ws| !ws.is_empty())
            .unwrap_or(self.default_workspace.as_str())
            .to_string()
    }

    /// Build the repository query, clamping the page size to `1..=max_page_size`.
    pub fn query_for(&self, request: &FeedRequest) -> ListQuery {
        let limit = request
            .limit
            .unwrap_or(self.config.default_page_size)
            .clamp(1, self.config.max_page_size.max(1));

        ListQuery::new(self.workspace_or_default(request.workspace.as_deref()), limit)
            .with_offset(request.offset.unwrap_or(0))
            .with_tag(request.tag.clone())
            .with_sort(SortOrder::from_param(request.sort.as_deref()))
    }

    pub async fn page(&self, request: &FeedRequest) -> Result<Vec<ImageRecord>, RepositoryError> {
        let query = self.query_for(request);
        let records = self.repository.list(&query).await?;
        debug!(
            workspace = %query.workspace_id,
            offset = query.offset,
            "Feed page returned {} records",
            records.len()
        );
        Ok(records)
    }

    pub async fn first_page(
        &self,
        request: &FeedRequest,
    ) -> Result<Vec<ImageRecord>, RepositoryError> {
        let request = FeedRequest {
            offset: Some(0),
            ..request.clone()
        };
        self.page(&request).await
    }

    pub async fn record(&self, id: i64) -> Result<Option<ImageRecord>, RepositoryError> {
        self.repository.get(id).await
    }

    pub async fn tags(&self, workspace: Option<&str>) -> Result<Vec<String>, RepositoryError> {
        self.repository
            .list_tags(&self.workspace_or_default(workspace))
            .await
    }

    /// Image count per workspace, across all workspaces.
    pub async fn stats(&self) -> Result<BTreeMap<String, i64>, RepositoryError> {
        self.repository.stats().await
    }
}
