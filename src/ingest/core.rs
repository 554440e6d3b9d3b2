use image::ImageReader;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{CreatedImage, FailedItem, IngestError, IngestReport, UploadRequest, UploadedFile};
use crate::ImagesConfig;
use crate::filters::{FilterHandle, FilterResolver};
use crate::repository::Repository;
use crate::store::{ContentKey, ContentStore, StoreError, Variant, formats};

/// Upload orchestration: resolve the filter, store the original, transform,
/// store the output, then register the metadata row.
#[derive(Clone)]
pub struct Ingestor {
    pub(super) store: ContentStore,
    pub(super) repository: Repository,
    pub(super) resolver: Arc<FilterResolver>,
    pub(super) images: ImagesConfig,
    pub(super) default_workspace: String,
}

impl Ingestor {
    pub fn new(
        store: ContentStore,
        repository: Repository,
        resolver: Arc<FilterResolver>,
        images: ImagesConfig,
        default_workspace: impl Into<String>,
    ) -> Self {
        Self {
            store,
            repository,
            resolver,
            images,
            default_workspace: default_workspace.into(),
        }
    }

    pub fn workspace_for(&self, request: &UploadRequest) -> String {
        request
            .workspace
            .clone()
            .unwrap_or_else(|| self.default_workspace.clone())
    }

    /// Ingest every file of the request under one resolved filter.
    ///
    /// A bad file is reported in [`IngestReport::failed`] and its siblings
    /// carry on. Only a request without files and repository failures are
    /// errors for the request as a whole.
    pub async fn ingest(&self, request: UploadRequest) -> Result<IngestReport, IngestError> {
        if request.files.is_empty() {
            return Err(IngestError::NoFiles);
        }

        let workspace_id = self.workspace_for(&request);
        let filter = self.resolver.resolve(&request.selection);
        info!(
            workspace = %workspace_id,
            filter = filter.name(),
            "Ingesting {} file(s)",
            request.files.len()
        );

        let mut report = IngestReport {
            workspace_id,
            created: Vec::new(),
            failed: Vec::new(),
        };

        for file in request.files {
            let file_name = file.file_name.clone();
            let result = self
                .ingest_one(file, &filter, &request.tags, &report.workspace_id)
                .await;
            match result {
                Ok(created) => report.created.push(created),
                Err(e @ IngestError::RepositoryError(_)) => return Err(e),
                Err(e) => {
                    warn!(file = ?file_name, "Failed to ingest file: {}", e);
                    report.failed.push(FailedItem {
                        file_name,
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    async fn ingest_one(
        &self,
        file: UploadedFile,
        filter: &FilterHandle,
        tags: &str,
        workspace_id: &str,
    ) -> Result<CreatedImage, IngestError> {
        self.check_size(&file.bytes)?;

        let store = self.store.clone();
        let filter = filter.clone();
        let jpeg_quality = self.images.jpeg_quality;
        let key = tokio::task::spawn_blocking(move || {
            store_and_transform(&store, &file, &filter, jpeg_quality)
        })
        .await??;

        // Metadata goes in last so a row never points at missing files.
        let record = self.repository.insert(key, tags, workspace_id).await?;
        info!(id = record.id, hash = %key, workspace = %workspace_id, "Image ingested");

        Ok(CreatedImage {
            id: record.id,
            hash: key,
        })
    }

    pub(super) fn check_size(&self, bytes: &[u8]) -> Result<(), IngestError> {
        if bytes.is_empty() {
            return Err(IngestError::EmptyFile);
        }
        if bytes.len() > self.images.max_upload_bytes {
            return Err(IngestError::TooLarge {
                size: bytes.len(),
                limit: self.images.max_upload_bytes,
            });
        }
        Ok(())
    }
}

fn store_and_transform(
    store: &ContentStore,
    file: &UploadedFile,
    filter: &FilterHandle,
    jpeg_quality: u8,
) -> Result<ContentKey, IngestError> {
    let extension = formats::extension_for(file.file_name.as_deref(), &file.bytes);

    let staged = store.stage(&file.bytes)?;
    let original = store.commit(staged, &extension)?;
    let key = original.key;

    let image = ImageReader::open(&original.path)
        .map_err(StoreError::from)?
        .with_guessed_format()
        .map_err(StoreError::from)?
        .decode()?;
    debug!(hash = %key, "Decoded {}x{} original", image.width(), image.height());

    let transformed = filter.apply(image);

    let format = formats::format_for_extension(&extension)?;
    let output = store.path_for(key, Variant::Output, &extension);
    formats::save(&transformed, &output, format, jpeg_quality)?;
    debug!(hash = %key, filter = filter.name(), "Stored output {:?}", output);

    Ok(key)
}
