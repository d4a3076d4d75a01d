//! Uploaded file types

use crate::Error;
use bytes::Bytes;
use std::path::{Path, PathBuf};

/// Media types accepted as images, paired with their canonical extension.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("image/gif", "gif"),
    ("image/jpeg", "jpg"),
    ("image/pjpeg", "jpg"),
    ("image/png", "png"),
    ("image/x-png", "png"),
    ("image/bmp", "bmp"),
    ("image/x-icon", "ico"),
];

/// Where the bytes of an upload live.
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    /// Content stays in a file on disk (e.g. a temp upload path)
    Borrowed(PathBuf),
    /// Content held in memory (e.g. decoded from a multipart body)
    Copied(Bytes),
}

/// Plain description of an upload, used to construct an [`UploadedFile`].
#[derive(Debug, Clone, PartialEq)]
pub struct FileDescriptor {
    /// Field key the file was submitted under
    pub key: String,
    /// Original filename
    pub name: String,
    /// Declared media type
    pub media_type: String,
    /// Declared size in bytes
    pub size: u64,
    /// File content
    pub content: FileContent,
}

impl FileDescriptor {
    /// Describe an in-memory upload; size is taken from the data.
    pub fn in_memory(
        key: impl Into<String>,
        name: impl Into<String>,
        media_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            key: key.into(),
            name: name.into(),
            media_type: media_type.into(),
            size: data.len() as u64,
            content: FileContent::Copied(data),
        }
    }
}

/// An uploaded file attached to a request.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    key: String,
    name: String,
    media_type: String,
    size: u64,
    extension: String,
    content: FileContent,
}

impl UploadedFile {
    /// Build a file from its descriptor.
    pub fn new(descriptor: FileDescriptor) -> Self {
        let extension = extension_of(&descriptor.name).to_string();
        Self {
            key: descriptor.key,
            name: descriptor.name,
            media_type: descriptor.media_type,
            size: descriptor.size,
            extension,
            content: descriptor.content,
        }
    }

    /// Field key the file was submitted under
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Original filename
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared media type
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Text after the last `.` of the original name, empty when there is none
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Where the content lives
    pub fn content(&self) -> &FileContent {
        &self.content
    }

    /// Read the file content, loading it from disk for borrowed content.
    pub fn read(&self) -> Result<Bytes, Error> {
        match &self.content {
            FileContent::Copied(data) => Ok(data.clone()),
            FileContent::Borrowed(path) => Ok(Bytes::from(std::fs::read(path)?)),
        }
    }

    /// Both the media type and the extension must belong to the image table.
    pub fn is_image(&self) -> bool {
        let known_type = IMAGE_TYPES.iter().any(|(ty, _)| *ty == self.media_type);
        let known_ext = IMAGE_TYPES
            .iter()
            .any(|(_, ext)| ext.eq_ignore_ascii_case(&self.extension));
        known_type && known_ext
    }

    /// `size > bytes`
    pub fn is_greater(&self, bytes: u64) -> bool {
        self.size > bytes
    }

    /// `size < bytes`
    pub fn is_less(&self, bytes: u64) -> bool {
        self.size < bytes
    }

    /// Same upload with its content moved to `path`.
    pub fn relocated(&self, path: impl AsRef<Path>) -> Self {
        Self {
            content: FileContent::Borrowed(path.as_ref().to_path_buf()),
            ..self.clone()
        }
    }
}

fn extension_of(name: &str) -> &str {
    name.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, media_type: &str, data: &'static [u8]) -> UploadedFile {
        UploadedFile::new(FileDescriptor::in_memory("upload", name, media_type, data))
    }

    #[test]
    fn test_extension() {
        assert_eq!(file("document.pdf", "application/pdf", b"").extension(), "pdf");
        assert_eq!(file("archive.tar.gz", "application/gzip", b"").extension(), "gz");
        assert_eq!(file("README", "text/plain", b"").extension(), "");
    }

    #[test]
    fn test_is_image() {
        assert!(file("photo.jpg", "image/jpeg", b"").is_image());
        assert!(file("photo.PNG", "image/x-png", b"").is_image());
        assert!(!file("photo.jpg", "application/pdf", b"").is_image());
        assert!(!file("photo.exe", "image/png", b"").is_image());
    }

    #[test]
    fn test_size_checks() {
        let f = file("file.txt", "text/plain", &[0; 1024]);
        assert_eq!(f.size(), 1024);
        assert!(f.is_greater(1023));
        assert!(!f.is_greater(1024));
        assert!(f.is_less(1025));
        assert!(!f.is_less(1024));
    }

    #[test]
    fn test_read_borrowed_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.tmp");
        std::fs::write(&path, b"hello").unwrap();

        let f = UploadedFile::new(FileDescriptor {
            key: "doc".into(),
            name: "hello.txt".into(),
            media_type: "text/plain".into(),
            size: 5,
            content: FileContent::Borrowed(path),
        });

        assert_eq!(f.read().unwrap(), Bytes::from_static(b"hello"));
    }
}
