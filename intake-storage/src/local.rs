//! Local filesystem storage backend.

use chrono::Local;
use intake_core::{FileContent, UploadedFile};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{Result, Storage, StorageError, generate_unique_key};

/// Local filesystem storage configuration.
#[derive(Debug, Clone)]
pub struct LocalStorageConfig {
    /// Base directory for file storage.
    pub base_path: PathBuf,
    /// Create the base directory if it doesn't exist.
    pub create_directories: bool,
    /// Lay files out as `YYYYMM/DD/` under the base directory.
    pub dated_directories: bool,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            base_path: PathBuf::from("storage/upload"),
            create_directories: true,
            dated_directories: true,
        }
    }
}

impl LocalStorageConfig {
    /// Create configuration with a base path.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            ..Default::default()
        }
    }

    /// Toggle the dated directory layout.
    pub fn with_dated_directories(mut self, dated: bool) -> Self {
        self.dated_directories = dated;
        self
    }
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    config: LocalStorageConfig,
}

impl LocalStorage {
    /// Create a new local storage backend.
    pub fn new(config: LocalStorageConfig) -> Result<Self> {
        if config.create_directories {
            fs::create_dir_all(&config.base_path).map_err(|e| {
                StorageError::Storage(format!(
                    "Failed to create storage directory {:?}: {}",
                    config.base_path, e
                ))
            })?;
        }

        info!(path = ?config.base_path, "Initialized local storage");

        Ok(Self { config })
    }

    /// Create with just a base path (convenience method).
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::new(LocalStorageConfig::new(path))
    }

    /// Storage configuration.
    pub fn config(&self) -> &LocalStorageConfig {
        &self.config
    }

    /// Directory new files are written to.
    pub fn target_dir(&self) -> PathBuf {
        let mut path = self.config.base_path.clone();
        if self.config.dated_directories {
            let now = Local::now();
            path.push(now.format("%Y%m").to_string());
            path.push(now.format("%d").to_string());
        }
        path
    }
}

impl Storage for LocalStorage {
    fn store(&self, file: &UploadedFile) -> Result<PathBuf> {
        let dir = self.target_dir();
        // Concurrent requests may race to create the same dated directory.
        fs::create_dir_all(&dir)?;

        let name = if file.name().is_empty() {
            None
        } else {
            Some(file.name())
        };
        let path = dir.join(generate_unique_key(name, true));

        match file.content() {
            FileContent::Borrowed(source) => move_file(source, &path)?,
            FileContent::Copied(data) => fs::write(&path, data)?,
        }

        info!(key = %file.key(), path = ?path, size = file.size(), "Stored upload");
        Ok(path)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(StorageError::NotFound(path.display().to_string()));
        }

        fs::remove_file(path)?;
        debug!(path = ?path, "Deleted file");
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Rename, falling back to copy and remove across filesystems.
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    fs::copy(from, to)?;
    fs::remove_file(from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::FileDescriptor;

    #[test]
    fn test_local_storage() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::with_path(temp_dir.path()).unwrap();

        let file = UploadedFile::new(FileDescriptor::in_memory("doc", "hello.txt", "text/plain", "Hello, World!"));

        // Store
        let path = storage.store(&file).unwrap();
        assert!(path.starts_with(temp_dir.path()));
        assert_eq!(path.extension().unwrap(), "txt");
        assert_eq!(fs::read(&path).unwrap(), b"Hello, World!");

        // Exists
        assert!(storage.exists(&path));
        assert!(!storage.exists(&temp_dir.path().join("nonexistent.txt")));

        // Delete
        storage.delete(&path).unwrap();
        assert!(!storage.exists(&path));
        assert!(storage.delete(&path).unwrap_err().is_not_found());
    }

    #[test]
    fn test_dated_layout() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::with_path(temp_dir.path()).unwrap();

        let relative = storage.target_dir();
        let relative = relative.strip_prefix(temp_dir.path()).unwrap();
        let parts: Vec<_> = relative.iter().map(|p| p.to_string_lossy().into_owned()).collect();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].len(), 6);
        assert_eq!(parts[1].len(), 2);

        let flat = LocalStorage::new(LocalStorageConfig::new(temp_dir.path()).with_dated_directories(false)).unwrap();
        assert_eq!(flat.target_dir(), temp_dir.path());
    }

    #[test]
    fn test_moves_borrowed_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        let upload = temp_dir.path().join("upload.tmp");
        fs::write(&upload, b"png bytes").unwrap();

        let storage = LocalStorage::with_path(temp_dir.path().join("store")).unwrap();
        let file = UploadedFile::new(FileDescriptor {
            key: "avatar".into(),
            name: "me.png".into(),
            media_type: "image/png".into(),
            size: 9,
            content: FileContent::Borrowed(upload.clone()),
        });

        let path = storage.store(&file).unwrap();
        assert!(!upload.exists());
        assert_eq!(fs::read(path).unwrap(), b"png bytes");
    }

    #[test]
    fn test_store_name_with_path_separators() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(LocalStorageConfig::new(temp_dir.path()).with_dated_directories(false)).unwrap();
        let file = UploadedFile::new(FileDescriptor::in_memory("doc", "report.v2/final", "text/plain", "v2"));

        let path = storage.store(&file).unwrap();
        assert_eq!(path.parent(), Some(temp_dir.path()));
        assert!(path.extension().is_none());
        assert_eq!(fs::read(&path).unwrap(), b"v2");
    }

    #[test]
    fn test_store_is_idempotent_about_directories() {
        let temp_dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::with_path(temp_dir.path()).unwrap();
        let file = UploadedFile::new(FileDescriptor::in_memory("a", "a.txt", "text/plain", "a"));

        let first = storage.store(&file).unwrap();
        let second = storage.store(&file).unwrap();
        assert_ne!(first, second);
        assert_eq!(first.parent(), second.parent());
    }
}
