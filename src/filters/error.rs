use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Description is not valid UTF-8")]
    NotUtf8,

    #[error("TOML description error: {0}")]
    TomlError(#[from] toml_edit::de::Error),

    #[error("JSON description error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Description contains no steps")]
    EmptyDescription,

    #[error("Unknown filter: {0}")]
    UnknownFilter(String),

    #[error("Invalid parameter for {filter}: {reason}")]
    InvalidParameter { filter: &'static str, reason: String },
}
