//! Generator errors
use thiserror::Error;

use flix_core::FlixError;
use flix_schema::SchemaError;

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error(transparent)]
    Build(#[from] FlixError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("CONFIG/{0}")]
    Config(String),

    #[error("CONFIG/failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl GeneratorError {
    /// The build failure underneath, when there is one.
    pub fn as_flix(&self) -> Option<&FlixError> {
        match self {
            Self::Build(e) => Some(e),
            _ => None,
        }
    }
}
