//! Uploaded file handling for intake
//!
//! This crate provides:
//! - Upload descriptors and the upload error-code table
//! - A per-request registry of uploaded files
//! - A storage trait with a local filesystem backend
//!
//! # Quick Start
//!
//! ```no_run
//! use intake_storage::*;
//!
//! # fn example() -> Result<()> {
//! let storage = LocalStorage::with_path("./uploads")?;
//!
//! let mut batch = UploadBatch::new();
//! batch.insert("avatar".into(), UploadDescriptor::temp("me.png", "image/png", "/tmp/upload-1", 2048));
//!
//! let mut registry = UploadedFileRegistry::new();
//! registry.add_files(batch)?;
//! let path = registry.persist("avatar", &storage)?;
//! println!("Stored: {}", path.display());
//!
//! // On rollback
//! registry.clean_all(&storage);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod local;
pub mod registry;
pub mod storage;
pub mod upload;

pub use error::*;
pub use local::*;
pub use registry::*;
pub use storage::*;
pub use upload::*;
