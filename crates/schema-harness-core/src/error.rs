//! Error types for the inference and versioning engine.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    /// The record source or version store could not be read or written.
    #[error("persistence failure: {0}")]
    Persistence(#[from] anyhow::Error),

    /// A requested schema version does not exist.
    #[error("schema version {0} not found")]
    VersionNotFound(i64),
}

impl SchemaError {
    /// True for lookups of versions that do not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SchemaError::VersionNotFound(_))
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;
