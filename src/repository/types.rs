use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::TagSet;
use crate::store::ContentKey;

pub const DEFAULT_AUTHOR: &str = "User";

fn default_author() -> String {
    DEFAULT_AUTHOR.to_string()
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub date: i64,
    #[serde(default = "default_author")]
    pub author: String,
}

impl Comment {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            date: now_millis(),
            author: default_author(),
        }
    }
}

/// One ingested image. Timestamps are milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: i64,
    pub hash: ContentKey,
    pub date: i64,
    pub tags: TagSet,
    pub likes: i64,
    pub shares: i64,
    pub comments: Vec<Comment>,
    pub last_updated: i64,
    pub workspace_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Descending id, i.e. insertion order.
    #[default]
    Newest,
    /// Descending `last_updated`.
    RecentActivity,
}

impl SortOrder {
    /// `recent` (and `lastUpdated`) select recent activity; anything else,
    /// including `id`, selects newest.
    pub fn from_param(param: Option<&str>) -> Self {
        match param.map(str::trim) {
            Some("recent") | Some("lastUpdated") | Some("last_updated") => SortOrder::RecentActivity,
            _ => SortOrder::Newest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListQuery {
    pub workspace_id: String,
    pub limit: u32,
    pub offset: u64,
    pub tag: Option<String>,
    pub sort: SortOrder,
}

impl ListQuery {
    pub fn new(workspace_id: impl Into<String>, limit: u32) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            limit,
            offset: 0,
            tag: None,
            sort: SortOrder::Newest,
        }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_tag(mut self, tag: Option<String>) -> Self {
        self.tag = tag.filter(|t| !t.trim().is_empty());
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}
