//! Upload descriptors as reported by the upload channel.

use bytes::Bytes;
use indexmap::IndexMap;
use intake_core::{FileContent, FileDescriptor};
use std::path::PathBuf;
use thiserror::Error;

/// Failure reported for a single upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadFailure {
    /// Codes 1 and 2, or larger than the configured maximum.
    #[error("the file exceeds the maximum upload size")]
    TooLarge,
    /// Code 3.
    #[error("the file was only partially uploaded")]
    Partial,
    /// Code 4.
    #[error("no file was uploaded")]
    NoFile,
    /// Code 6.
    #[error("missing a temporary folder")]
    MissingTempDir,
    /// Code 7.
    #[error("failed to write the file to disk")]
    WriteFailure,
    /// Code 8.
    #[error("the upload was stopped by an extension")]
    Rejected,
    /// Any other non-zero code.
    #[error("unknown upload error code {0}")]
    Unknown(i32),
}

impl UploadFailure {
    /// Map an upload error code; `0` means success.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => None,
            1 | 2 => Some(Self::TooLarge),
            3 => Some(Self::Partial),
            4 => Some(Self::NoFile),
            6 => Some(Self::MissingTempDir),
            7 => Some(Self::WriteFailure),
            8 => Some(Self::Rejected),
            other => Some(Self::Unknown(other)),
        }
    }

    /// HTTP status for transports.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::TooLarge => 413,
            Self::Partial | Self::NoFile => 400,
            _ => 500,
        }
    }
}

/// Where an upload's bytes were put by the upload channel.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadSource {
    /// Temporary file written by the server.
    TempPath(PathBuf),
    /// Content read into memory.
    Content(Bytes),
}

/// One entry of an upload batch.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadDescriptor {
    /// Original file name.
    pub name: String,
    /// Declared media type.
    pub media_type: String,
    /// Where the bytes are.
    pub source: UploadSource,
    /// Declared size in bytes.
    pub size: u64,
    /// Upload channel error code, `0` on success.
    pub error_code: i32,
}

impl UploadDescriptor {
    /// Describe an upload stored in a temporary file.
    pub fn temp(
        name: impl Into<String>,
        media_type: impl Into<String>,
        path: impl Into<PathBuf>,
        size: u64,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            source: UploadSource::TempPath(path.into()),
            size,
            error_code: 0,
        }
    }

    /// Describe an upload held in memory.
    pub fn in_memory(name: impl Into<String>, media_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            media_type: media_type.into(),
            size: data.len() as u64,
            source: UploadSource::Content(data),
            error_code: 0,
        }
    }

    /// Set the upload channel error code.
    pub fn with_error(mut self, code: i32) -> Self {
        self.error_code = code;
        self
    }

    /// The failure the error code stands for, if any.
    pub fn failure(&self) -> Option<UploadFailure> {
        UploadFailure::from_code(self.error_code)
    }

    /// Convert into a file descriptor under `key`.
    pub fn into_file_descriptor(self, key: impl Into<String>) -> FileDescriptor {
        FileDescriptor {
            key: key.into(),
            name: self.name,
            media_type: self.media_type,
            size: self.size,
            content: match self.source {
                UploadSource::TempPath(path) => FileContent::Borrowed(path),
                UploadSource::Content(data) => FileContent::Copied(data),
            },
        }
    }
}

/// Upload batch keyed by field name, in submission order.
pub type UploadBatch = IndexMap<String, UploadDescriptor>;
