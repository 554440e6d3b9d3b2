use axum::extract::Multipart;
use serde::Serialize;
use tracing::debug;

use super::IngestError;
use crate::filters::FilterSelection;
use crate::store::ContentKey;

pub const FILTER_CLASS_FIELD: &str = "filterClass";
pub const FILTER_FIELD: &str = "filter";
pub const TAGS_FIELD: &str = "tags";
pub const WORKSPACE_FIELD: &str = "workspace";
/// The image part of a preview request.
pub const PREVIEW_FIELD: &str = "customFile";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: Option<String>,
    pub bytes: Vec<u8>,
}

/// An upload request with control fields separated from image parts.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub selection: FilterSelection,
    pub tags: String,
    pub workspace: Option<String>,
    pub files: Vec<UploadedFile>,
}

impl UploadRequest {
    pub async fn from_multipart(mut multipart: Multipart) -> Result<Self, IngestError> {
        let mut request = UploadRequest::default();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(|s| s.to_string());

            match (name.as_str(), file_name) {
                (FILTER_FIELD, Some(_)) => {
                    request.selection.description_file = Some(field.bytes().await?.to_vec());
                }
                (FILTER_FIELD, None) => {
                    request.selection.description_text = Some(field.text().await?);
                }
                (FILTER_CLASS_FIELD, _) => {
                    request.selection.filter_class = Some(field.text().await?.trim().to_string());
                }
                (TAGS_FIELD, _) => request.tags = field.text().await?,
                (WORKSPACE_FIELD, _) => {
                    let workspace = field.text().await?.trim().to_string();
                    if workspace.chars().any(|c| c.is_control() || c == '/') {
                        return Err(IngestError::InvalidWorkspace);
                    }
                    request.workspace = (!workspace.is_empty()).then_some(workspace);
                }
                (_, Some(file_name)) => request.files.push(UploadedFile {
                    field: name.clone(),
                    file_name: Some(file_name),
                    bytes: field.bytes().await?.to_vec(),
                }),
                (other, None) => debug!("Ignoring multipart field '{}'", other),
            }
        }

        Ok(request)
    }

    /// The image a preview should render: the `customFile` part, or failing
    /// that the first file.
    pub fn preview_file(&self) -> Option<&UploadedFile> {
        self.files
            .iter()
            .find(|f| f.field == PREVIEW_FIELD)
            .or_else(|| self.files.first())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedImage {
    pub id: i64,
    pub hash: ContentKey,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedItem {
    pub file_name: Option<String>,
    pub error: String,
}

/// Outcome of one ingest request. Items that failed are listed separately
/// and never abort their siblings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestReport {
    pub workspace_id: String,
    pub created: Vec<CreatedImage>,
    pub failed: Vec<FailedItem>,
}
