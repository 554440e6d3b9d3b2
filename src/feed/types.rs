use serde::Deserialize;

/// Query string of `GET /list`. Every field is optional; the service fills in
/// the configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedRequest {
    pub workspace: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u64>,
    pub tag: Option<String>,
    pub sort: Option<String>,
}

impl FeedRequest {
    pub fn for_workspace(workspace: impl Into<String>) -> Self {
        Self {
            workspace: Some(workspace.into()),
            ..Default::default()
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceQuery {
    pub workspace: Option<String>,
}
