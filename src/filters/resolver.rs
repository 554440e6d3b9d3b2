use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{FilterError, FilterHandle, FilterRegistry, identity, parse_description_file};

/// The filter-related inputs of one upload request.
#[derive(Debug, Default, Clone)]
pub struct FilterSelection {
    /// Registry identifier from the `filterClass` form field.
    pub filter_class: Option<String>,
    /// Bytes of an uploaded description file (`filter` part with a file name).
    pub description_file: Option<Vec<u8>>,
    /// Inline description text (`filter` form field).
    pub description_text: Option<String>,
}

impl FilterSelection {
    pub fn is_empty(&self) -> bool {
        self.filter_class.is_none()
            && self.description_file.is_none()
            && self.description_text.is_none()
    }
}

#[derive(Clone)]
pub struct FilterResolver {
    registry: Arc<FilterRegistry>,
    scratch_dir: Option<PathBuf>,
}

impl FilterResolver {
    pub fn new(registry: Arc<FilterRegistry>) -> Self {
        Self {
            registry,
            scratch_dir: None,
        }
    }

    /// Directory for temporary description buffers. Defaults to the system
    /// temp directory.
    pub fn with_scratch_dir(mut self, dir: PathBuf) -> Self {
        self.scratch_dir = Some(dir);
        self
    }

    pub fn registry(&self) -> &FilterRegistry {
        &self.registry
    }

    /// Resolve a selection to exactly one filter. Never fails: every
    /// resolution error is logged and the next source is tried, ending at
    /// the identity filter.
    pub fn resolve(&self, selection: &FilterSelection) -> FilterHandle {
        if let Some(class) = selection
            .filter_class
            .as_deref()
            .filter(|c| !c.trim().is_empty())
        {
            match self.registry.create(class) {
                Ok(filter) => {
                    debug!("Resolved filter class '{}'", class);
                    return filter;
                }
                Err(e) => warn!("Failed to load filter class: {}", e),
            }
        }

        if let Some(bytes) = selection.description_file.as_deref().filter(|b| !b.is_empty()) {
            match self.parse_buffered(bytes) {
                Ok(filter) => return filter,
                Err(e) => warn!("Could not load filter file: {}", e),
            }
        }

        if let Some(text) = selection
            .description_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
        {
            match self.parse_buffered(text.as_bytes()) {
                Ok(filter) => return filter,
                Err(e) => warn!("Could not load filter text: {}", e),
            }
        }

        identity()
    }

    /// Spool a description into a temp file and parse it from there. The
    /// file is removed when the handle drops, on success or failure.
    fn parse_buffered(&self, bytes: &[u8]) -> Result<FilterHandle, FilterError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("filter_").suffix(".desc");
        let mut buffer = match &self.scratch_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        buffer.write_all(bytes)?;
        buffer.flush()?;

        parse_description_file(buffer.path())
    }
}
