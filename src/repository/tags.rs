use serde::{Serialize, Serializer};
use std::fmt;

pub const TAG_DELIMITER: char = ',';
const STORAGE_SEPARATOR: &str = ", ";

/// Split a delimited tag string into trimmed, non-empty labels.
pub fn split_tags(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(TAG_DELIMITER)
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
}

/// A set of free-text labels kept in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(Vec<String>);

impl TagSet {
    pub fn parse(raw: &str) -> Self {
        let mut tags: Vec<String> = Vec::new();
        for tag in split_tags(raw) {
            if !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_string());
            }
        }
        Self(tags)
    }
}

/// Storage form: labels joined with `", "`.
impl fmt::Display for TagSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(STORAGE_SEPARATOR))
    }
}

impl Serialize for TagSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Substring a stored tag string must contain, once wrapped as
/// `", " + tags + ","`, for `tag` to be one of its labels.
pub(crate) fn delimited_needle(tag: &str) -> String {
    format!("{}{}{}", STORAGE_SEPARATOR, tag.trim(), TAG_DELIMITER)
}
