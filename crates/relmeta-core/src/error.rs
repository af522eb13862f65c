//! Error types for relmeta

use thiserror::Error;

/// Core error type for metadata operations
#[derive(Error, Debug)]
pub enum MetaError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Schema error: {0}")]
    Schema(String),

    /// A table or column load failed. The cache entry stays unloaded so the
    /// next caller retries; the underlying cause is kept for diagnostics.
    #[error("unable to load metadata for {object}")]
    MetadataLoad {
        object: String,
        #[source]
        source: Box<MetaError>,
    },

    #[error("Not supported: {0}")]
    NotSupported(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl MetaError {
    /// Wrap a fetch failure with the name of the object whose metadata could
    /// not be loaded.
    pub fn metadata_load(object: impl Into<String>, source: MetaError) -> Self {
        MetaError::MetadataLoad {
            object: object.into(),
            source: Box::new(source),
        }
    }
}

/// Result type alias for metadata operations
pub type Result<T> = std::result::Result<T, MetaError>;
