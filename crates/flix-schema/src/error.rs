//! Schema errors
use flix_core::FlixError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("template has no f_version tag")]
    MissingVersion,

    #[error("unsupported template version: {0}")]
    UnsupportedVersion(String),

    /// The version tag was understood but the document does not match it.
    #[error("malformed {format} template: {source}")]
    Malformed {
        format: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<SchemaError> for FlixError {
    fn from(err: SchemaError) -> Self {
        match err {
            SchemaError::MissingVersion => FlixError::UnsupportedFormatVersion(String::new()),
            SchemaError::UnsupportedVersion(v) => FlixError::UnsupportedFormatVersion(v),
            other => FlixError::Schema(other.to_string()),
        }
    }
}
