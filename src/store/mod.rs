// Content store module - content-addressed artifacts and the thumbnail cache
mod core;
mod error;
mod fingerprint;
pub mod formats;
mod serve;
mod thumbnail;

pub use core::{ContentStore, StagedUpload, StoredOriginal, Variant};
pub use error::StoreError;
pub use fingerprint::ContentKey;
pub use serve::serve_file;
pub use thumbnail::{Thumbnail, ThumbnailSource};
