use axum::extract::multipart::MultipartError;
use thiserror::Error;

use crate::repository::RepositoryError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Invalid multipart request: {0}")]
    Multipart(#[from] MultipartError),
    #[error("Request contains no image files")]
    NoFiles,
    #[error("Invalid workspace name")]
    InvalidWorkspace,
    #[error("Empty file provided")]
    EmptyFile,
    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },
    #[error("Image error: {0}")]
    ImageError(#[from] image::ImageError),
    #[error("Store error: {0}")]
    StoreError(#[from] StoreError),
    #[error("Repository error: {0}")]
    RepositoryError(#[from] RepositoryError),
    #[error("Background task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

impl IngestError {
    /// Whether the failure is the client's doing rather than the server's.
    pub fn is_bad_input(&self) -> bool {
        matches!(
            self,
            IngestError::Multipart(_)
                | IngestError::NoFiles
                | IngestError::InvalidWorkspace
                | IngestError::EmptyFile
                | IngestError::TooLarge { .. }
                | IngestError::ImageError(_)
                | IngestError::StoreError(StoreError::ImageError(_))
                | IngestError::StoreError(StoreError::UnsupportedFormat(_))
        )
    }
}
