//! Storage error types.

use crate::UploadFailure;
use thiserror::Error;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Upload and storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The upload channel reported a failure for one file.
    #[error("Upload of `{key}` failed: {failure}")]
    Upload {
        /// Field key of the failed upload.
        key: String,
        /// Reported failure.
        failure: UploadFailure,
    },

    /// Several uploads in one batch failed.
    #[error("{} uploads failed", .0.len())]
    Uploads(Vec<(String, UploadFailure)>),

    /// File not found.
    #[error("File not found: {0}")]
    NotFound(String),

    /// Storage backend error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Check if this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this reports upload failures.
    pub fn is_upload(&self) -> bool {
        matches!(self, Self::Upload { .. } | Self::Uploads(_))
    }

    /// Every `(key, failure)` pair this error reports.
    pub fn failures(&self) -> Vec<(String, UploadFailure)> {
        match self {
            Self::Upload { key, failure } => vec![(key.clone(), *failure)],
            Self::Uploads(failures) => failures.clone(),
            _ => Vec::new(),
        }
    }

    /// Convert to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Upload { failure, .. } => failure.status_code(),
            Self::Uploads(failures) => match failures.as_slice() {
                [(_, failure)] => failure.status_code(),
                _ => 400,
            },
            Self::NotFound(_) => 404,
            _ => 500,
        }
    }
}

impl From<StorageError> for intake_core::Error {
    fn from(error: StorageError) -> Self {
        match error.status_code() {
            404 => intake_core::Error::NotFound(error.to_string()),
            413 => intake_core::Error::PayloadTooLarge(error.to_string()),
            400 => intake_core::Error::BadRequest(error.to_string()),
            _ => intake_core::Error::Internal(error.to_string()),
        }
    }
}
