//! Error types for chunk meshing and manifest generation.

use thiserror::Error;

/// Result type alias using MeshTaskError.
pub type Result<T> = std::result::Result<T, MeshTaskError>;

/// Main error type for mesh tasks.
#[derive(Error, Debug)]
pub enum MeshTaskError {
    /// Failed to serialize or parse JSON data.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The requested mesh encoding is not one we can produce.
    #[error("Encoding {requested} is not supported. Options: {supported}")]
    UnsupportedEncoding { requested: String, supported: String },

    /// Task options are inconsistent with each other.
    #[error("Invalid task configuration: {0}")]
    InvalidConfig(String),

    /// No mesh directory was given and the dataset info has none either.
    #[error("The mesh destination is not present in the info file.")]
    MissingMeshDir,

    /// The direct shard layout needs a dataset with mesh sharding.
    #[error("The mesh sharding parameter must be defined.")]
    ShardingNotConfigured,

    /// Object storage rejected a read or write.
    #[error("Storage error for {key}: {message}")]
    Storage { key: String, message: String },

    /// The external volume source failed to produce data.
    #[error("Volume download error: {0}")]
    Download(String),

    /// The external mesher failed or returned an inconsistent mesh.
    #[error("Mesher error: {0}")]
    Mesher(String),

    /// Failed to encode a mesh fragment.
    #[error("Encode error: {0}")]
    Encode(String),

    /// A batched fragment file could not be parsed.
    #[error("Malformed fragment batch: {0}")]
    MalformedFragmentBatch(String),
}

impl MeshTaskError {
    pub(crate) fn storage(key: impl Into<String>, message: impl ToString) -> Self {
        MeshTaskError::Storage {
            key: key.into(),
            message: message.to_string(),
        }
    }
}
