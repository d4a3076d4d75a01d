// Intake - HTTP request input for Rust
//
// This library decodes request bodies, collects uploaded files and validates
// input against pipe-separated rule strings.

mod request;

pub use request::{Request, RequestError};

// Re-export the member crates
pub use intake_core;
pub use intake_storage;
pub use intake_validation;

#[cfg(feature = "config")]
pub use intake_config;

pub use intake_core::{
    FieldMap, FieldValue, FileContent, FileDescriptor, ParsedBody, UploadedFile, parse_body,
};
pub use intake_storage::{
    LocalStorage, LocalStorageConfig, Storage, StorageError, UploadBatch, UploadDescriptor,
    UploadFailure, UploadedFileRegistry,
};
pub use intake_validation::{
    FilterRegistry, RuleEvaluator, RuleSet, RuleSpec, RuleViolation, ValidationError,
    ValidationPipe, Validator, ValidatorOptions,
};

// Prelude for common imports
pub mod prelude {
    pub use crate::{
        FieldMap, FieldValue, FilterRegistry, Request, RequestError, RuleEvaluator, RuleSet,
        Storage, UploadBatch, UploadDescriptor, UploadedFile, UploadedFileRegistry,
        ValidationError, ValidationPipe, Validator,
    };

    #[cfg(feature = "config")]
    pub use intake_config::IntakeConfig;
}
