//! Storage trait and common helpers.

use intake_core::UploadedFile;
use std::path::{Path, PathBuf};

use crate::Result;

/// Persistence backend for uploaded files.
pub trait Storage: Send + Sync {
    /// Persist an upload and return where it was stored.
    fn store(&self, file: &UploadedFile) -> Result<PathBuf>;

    /// Delete a stored file.
    fn delete(&self, path: &Path) -> Result<()>;

    /// Check if a stored file exists.
    fn exists(&self, path: &Path) -> bool;
}

/// Generate a unique file key.
///
/// Only the extension of the last path component of `original_name` is kept,
/// so a client-supplied name can never add directories to the key.
pub fn generate_unique_key(original_name: Option<&str>, preserve_extension: bool) -> String {
    let id = uuid::Uuid::new_v4();

    if preserve_extension
        && let Some(name) = original_name
        && let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str())
        && !ext.is_empty()
    {
        return format!("{}.{}", id, ext);
    }

    id.to_string()
}
