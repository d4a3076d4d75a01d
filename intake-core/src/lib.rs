//! Core request input types for intake
//!
//! - [`FieldValue`] / [`FieldMap`]: the value model every other crate works on
//! - [`UploadedFile`]: an upload, borrowed from a temp path or copied in memory
//! - [`parse_body`]: body decoding by content type
//! - [`MultipartParser`]: boundary-scanning multipart decoder
//! - [`logging`]: optional `tracing` subscriber setup

pub mod error;
pub mod file;
pub mod form;
pub mod logging;
pub mod multipart;
pub mod value;
mod xml;

pub use error::{Error, Result};
pub use file::{FileContent, FileDescriptor, UploadedFile};
pub use form::{parse_body, parse_form_map, parse_json_map, ParsedBody};
pub use multipart::{MultipartBody, MultipartParser};
pub use value::{field_map, insert_field, FieldMap, FieldValue};
pub use xml::parse_xml_map;
