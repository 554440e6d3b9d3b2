use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use super::{FilterError, FilterHandle, Operation, Pipeline};

/// A filter description document.
///
/// Accepted as TOML:
///
/// ```toml
/// name = "moody"
///
/// [[steps]]
/// op = "contrast"
/// amount = 20.0
///
/// [[steps]]
/// op = "grayscale"
/// ```
///
/// or as JSON, either the same table shape or a bare array of steps.
#[derive(Debug, Deserialize)]
pub struct FilterDescription {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub steps: Vec<Operation>,
}

impl FilterDescription {
    pub fn parse(bytes: &[u8]) -> Result<Self, FilterError> {
        let text = std::str::from_utf8(bytes).map_err(|_| FilterError::NotUtf8)?;
        let trimmed = text.trim_start_matches('\u{feff}').trim();

        // A leading '[' is either a JSON step array or a TOML table header.
        let description = if trimmed.starts_with('{') {
            serde_json::from_str(trimmed)?
        } else if trimmed.starts_with('[') {
            match serde_json::from_str::<Vec<Operation>>(trimmed) {
                Ok(steps) => FilterDescription { name: None, steps },
                Err(_) => toml_edit::de::from_str(trimmed)?,
            }
        } else {
            toml_edit::de::from_str(trimmed)?
        };

        Ok(description)
    }

    pub fn into_filter(self) -> Result<FilterHandle, FilterError> {
        if self.steps.is_empty() {
            return Err(FilterError::EmptyDescription);
        }
        for step in &self.steps {
            step.validate()?;
        }

        let name = self.name.unwrap_or_else(|| {
            self.steps
                .iter()
                .map(Operation::op_name)
                .collect::<Vec<_>>()
                .join("+")
        });
        debug!("Built filter '{}' from {} steps", name, self.steps.len());

        Ok(Arc::new(Pipeline::new(name, self.steps)))
    }
}

pub fn parse_description(bytes: &[u8]) -> Result<FilterHandle, FilterError> {
    FilterDescription::parse(bytes)?.into_filter()
}

pub fn parse_description_file(path: &Path) -> Result<FilterHandle, FilterError> {
    let bytes = std::fs::read(path)?;
    parse_description(&bytes)
}
