//! Per-request registry of uploaded files.

use indexmap::IndexMap;
use intake_core::{FieldMap, FieldValue, FileDescriptor, UploadedFile};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{Result, Storage, StorageError, UploadBatch, UploadDescriptor, UploadFailure};

/// Uploaded files of one request, keyed by field name.
///
/// Files are only deleted from storage by [`clean_all`](Self::clean_all),
/// which callers run when rolling back; dropping the registry leaves
/// persisted files in place. Every persisted copy stays tracked for
/// `clean_all`, including copies of files later removed or replaced.
#[derive(Debug, Clone, Default)]
pub struct UploadedFileRegistry {
    files: IndexMap<String, Arc<UploadedFile>>,
    /// Stored path of each current file that was persisted
    saved: IndexMap<String, PathBuf>,
    /// Every copy written to storage and not yet cleaned
    stored: Vec<(String, PathBuf)>,
    max_file_size: Option<u64>,
}

impl UploadedFileRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject uploads larger than `bytes` with [`UploadFailure::TooLarge`].
    pub fn with_max_file_size(mut self, bytes: Option<u64>) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Add one upload under `key`, replacing any file already there.
    pub fn add_file(&mut self, key: &str, descriptor: UploadDescriptor) -> Result<Arc<UploadedFile>> {
        if let Some(failure) = descriptor.failure() {
            warn!(key = %key, code = descriptor.error_code, "Upload reported an error");
            return Err(StorageError::Upload {
                key: key.to_string(),
                failure,
            });
        }
        self.insert(descriptor.into_file_descriptor(key))
    }

    /// Add every upload in `batch`.
    ///
    /// Failing uploads do not stop the batch; the files that passed are kept
    /// and all failures are reported together.
    pub fn add_files(&mut self, batch: UploadBatch) -> Result<usize> {
        let mut added = 0;
        let mut failures = Vec::new();

        for (key, descriptor) in batch {
            match self.add_file(&key, descriptor) {
                Ok(_) => added += 1,
                Err(StorageError::Upload { key, failure }) => failures.push((key, failure)),
                Err(other) => return Err(other),
            }
        }

        if failures.is_empty() {
            Ok(added)
        } else {
            Err(StorageError::Uploads(failures))
        }
    }

    /// Add files decoded from a multipart body.
    pub fn add_parsed(&mut self, files: Vec<FileDescriptor>) -> Result<usize> {
        let mut added = 0;
        let mut failures = Vec::new();

        for descriptor in files {
            let key = descriptor.key.clone();
            match self.insert(descriptor) {
                Ok(_) => added += 1,
                Err(StorageError::Upload { failure, .. }) => failures.push((key, failure)),
                Err(other) => return Err(other),
            }
        }

        if failures.is_empty() {
            Ok(added)
        } else {
            Err(StorageError::Uploads(failures))
        }
    }

    fn insert(&mut self, descriptor: FileDescriptor) -> Result<Arc<UploadedFile>> {
        if let Some(limit) = self.max_file_size
            && descriptor.size > limit
        {
            warn!(key = %descriptor.key, size = descriptor.size, limit, "Upload exceeds size limit");
            return Err(StorageError::Upload {
                key: descriptor.key,
                failure: UploadFailure::TooLarge,
            });
        }

        let file = Arc::new(UploadedFile::new(descriptor));
        self.saved.shift_remove(file.key());
        self.files.insert(file.key().to_string(), Arc::clone(&file));
        Ok(file)
    }

    pub fn has(&self, key: &str) -> bool {
        self.files.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Arc<UploadedFile>> {
        self.files.get(key)
    }

    /// All files in insertion order.
    pub fn all(&self) -> impl Iterator<Item = (&str, &Arc<UploadedFile>)> {
        self.files.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Files as field values, for merging into request input.
    pub fn files(&self) -> FieldMap {
        self.files
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::File(Arc::clone(v))))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Forget a file. A persisted copy stays in storage until
    /// [`clean_all`](Self::clean_all).
    pub fn remove(&mut self, key: &str) -> Option<Arc<UploadedFile>> {
        self.saved.shift_remove(key);
        self.files.shift_remove(key)
    }

    /// Persist one file and point it at its stored copy.
    pub fn persist(&mut self, key: &str, storage: &dyn Storage) -> Result<PathBuf> {
        let file = self
            .files
            .get(key)
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        let path = storage.store(file)?;
        let relocated = Arc::new(file.relocated(&path));
        self.files.insert(key.to_string(), relocated);
        self.saved.insert(key.to_string(), path.clone());
        self.stored.push((key.to_string(), path.clone()));

        info!(key = %key, path = ?path, "Persisted upload");
        Ok(path)
    }

    /// Persist every file not persisted yet.
    pub fn persist_all(&mut self, storage: &dyn Storage) -> Result<Vec<(String, PathBuf)>> {
        let pending: Vec<String> = self
            .files
            .keys()
            .filter(|key| !self.saved.contains_key(*key))
            .cloned()
            .collect();

        pending
            .into_iter()
            .map(|key| {
                let path = self.persist(&key, storage)?;
                Ok((key, path))
            })
            .collect()
    }

    /// Where a file was persisted, if it was.
    pub fn saved_path(&self, key: &str) -> Option<&Path> {
        self.saved.get(key).map(PathBuf::as_path)
    }

    /// Delete every persisted file.
    ///
    /// Returns whether each deletion succeeded, in the order the copies were
    /// stored. A failure is logged and does not stop the remaining
    /// deletions; failed entries stay recorded.
    pub fn clean_all(&mut self, storage: &dyn Storage) -> Vec<(String, bool)> {
        let mut results = Vec::with_capacity(self.stored.len());
        let saved = &mut self.saved;

        self.stored.retain(|(key, path)| match storage.delete(path) {
            Ok(()) => {
                if saved.get(key) == Some(path) {
                    saved.shift_remove(key);
                }
                results.push((key.clone(), true));
                false
            }
            Err(e) => {
                warn!(key = %key, path = ?path, error = %e, "Failed to clean up upload");
                results.push((key.clone(), false));
                true
            }
        });

        results
    }
}
