//! Error types for versioner-sync.

use std::path::PathBuf;

use thiserror::Error;

use versioner_api::ApiError;
use versioner_core::{ManifestError, ParamsError};

/// All errors that can arise from reconciling and publishing.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A local file could not be listed, read, hashed or moved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The storage service failed or answered with a non-success status.
    #[error("storage service error: {0}")]
    Api(#[from] ApiError),

    #[error("manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Required run configuration is missing or unreadable.
    #[error("configuration error: {0}")]
    Params(#[from] ParamsError),

    /// Sidecar serialization error.
    #[error("sidecar JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The service rejected the version-creation request.
    #[error("failed to create dataset version (HTTP {status}): {body}")]
    PublishFailed { status: u16, body: String },

    /// The manifest does not say which execution produced the uploads.
    #[error("manifest has no execution id; cannot resolve uploaded data")]
    MissingExecutionId,

    /// A generated content name is not a plain file name.
    #[error("invalid content file name '{0}'")]
    InvalidFileName(String),
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
