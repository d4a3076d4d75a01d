//! Request body decoding by content type

use crate::file::FileDescriptor;
use crate::multipart::{MultipartBody, MultipartParser};
use crate::value::{FieldMap, FieldValue, insert_field};
use crate::{xml, Error};
use bytes::Bytes;
use mime::Mime;
use tracing::debug;

/// Fields and files decoded from one request body
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedBody {
    /// Decoded fields, in body order
    pub fields: FieldMap,
    /// File parts (multipart bodies only)
    pub files: Vec<FileDescriptor>,
}

impl From<MultipartBody> for ParsedBody {
    fn from(body: MultipartBody) -> Self {
        Self {
            fields: body.fields,
            files: body.files,
        }
    }
}

impl From<FieldMap> for ParsedBody {
    fn from(fields: FieldMap) -> Self {
        Self {
            fields,
            files: Vec::new(),
        }
    }
}

/// Parse URL-encoded form data into a field map
pub fn parse_form_map(body: &[u8]) -> Result<FieldMap, Error> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_bytes(body)
        .map_err(|e| Error::BadRequest(format!("Failed to parse form data: {}", e)))?;

    let mut fields = FieldMap::new();
    for (name, value) in pairs {
        insert_field(&mut fields, &name, FieldValue::String(value));
    }
    Ok(fields)
}

/// Parse a JSON object body into a field map
pub fn parse_json_map(body: &[u8]) -> Result<FieldMap, Error> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(FieldMap::new());
    }

    let value: serde_json::Value = serde_json::from_slice(body)
        .map_err(|e| Error::BadRequest(format!("Failed to parse JSON body: {}", e)))?;

    match FieldValue::from(value) {
        FieldValue::Map(fields) => Ok(fields),
        other => Err(Error::BadRequest(format!(
            "JSON body must be an object, got {}",
            other.kind_name()
        ))),
    }
}

/// Decode a request body according to its `Content-Type`.
///
/// Unknown or missing content types fall back to query-string decoding.
pub fn parse_body(content_type: Option<&str>, body: Bytes) -> Result<ParsedBody, Error> {
    if body.is_empty() {
        return Ok(ParsedBody::default());
    }

    let Some(mime) = content_type.and_then(|ct| ct.parse::<Mime>().ok()) else {
        debug!(content_type = ?content_type, "decoding body as query string");
        return parse_form_map(&body).map(ParsedBody::from);
    };

    let (ty, subtype, suffix) = (mime.type_(), mime.subtype(), mime.suffix());

    if ty == mime::MULTIPART {
        let boundary = mime
            .get_param(mime::BOUNDARY)
            .ok_or_else(|| Error::BadRequest("Missing boundary in Content-Type".to_string()))?;
        return MultipartParser::new(boundary.as_str())?
            .parse(body)
            .map(ParsedBody::from);
    }

    if ty == mime::APPLICATION && subtype == mime::WWW_FORM_URLENCODED {
        return parse_form_map(&body).map(ParsedBody::from);
    }

    if (ty == mime::APPLICATION && subtype == mime::JSON) || suffix == Some(mime::JSON) {
        return parse_json_map(&body).map(ParsedBody::from);
    }

    if ((ty == mime::APPLICATION || ty == mime::TEXT) && subtype == mime::XML)
        || suffix == Some(mime::XML)
    {
        return xml::parse_xml_map(&body).map(ParsedBody::from);
    }

    debug!(content_type = %mime, "decoding body as query string");
    parse_form_map(&body).map(ParsedBody::from)
}
