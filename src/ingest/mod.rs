// Ingest module - multipart uploads through filter, store and repository
mod core;
mod error;
mod handlers;
mod preview;
mod types;

pub use core::Ingestor;
pub use error::IngestError;
pub use handlers::{form_handler, preview_handler, upload_handler};
pub use preview::fit_width;
pub use types::{
    CreatedImage, FailedItem, IngestReport, PREVIEW_FIELD, UploadRequest, UploadedFile,
};
