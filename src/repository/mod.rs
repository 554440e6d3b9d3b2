// Metadata repository - one row per ingested image
mod core;
mod error;
mod tags;
mod types;

pub use core::Repository;
pub use error::RepositoryError;
pub use tags::{TAG_DELIMITER, TagSet, split_tags};
pub use types::{Comment, DEFAULT_AUTHOR, ImageRecord, ListQuery, SortOrder};
