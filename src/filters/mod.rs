// Filters module - named presets, description documents and resolution
mod builtin;
mod description;
mod error;
mod registry;
mod resolver;

pub use builtin::{Operation, Pipeline};
pub use description::{FilterDescription, parse_description, parse_description_file};
pub use error::FilterError;
pub use registry::{FilterFactory, FilterRegistry};
pub use resolver::{FilterResolver, FilterSelection};

use image::DynamicImage;
use std::sync::Arc;

/// An executable image transformation.
pub trait Filter: Send + Sync {
    fn name(&self) -> &str;

    fn apply(&self, image: DynamicImage) -> DynamicImage;
}

pub type FilterHandle = Arc<dyn Filter>;

/// The no-op filter every failed or absent selection degrades to.
pub fn identity() -> FilterHandle {
    Arc::new(Operation::Identity)
}

#[cfg(test)]
mod tests;
