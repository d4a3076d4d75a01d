//! Multipart body parsing
//!
//! Splits an undecoded `multipart/form-data` body into text fields and file
//! parts without relying on a framework form decoder.
//!
//! The parser walks the body by byte offsets through four states:
//!
//! ```text
//! Preamble ──delimiter──▶ Headers ──CRLFCRLF──▶ Body ──delimiter──▶ Headers ...
//!                                                  └──close delimiter──▶ Done
//! ```
//!
//! A delimiter (`--boundary`) only counts when it opens the body or follows a
//! CRLF, and is itself followed by CRLF (optionally after linear whitespace)
//! or by `--` for the close delimiter. Boundary-like bytes inside file content
//! that do not satisfy both anchors are left in the content.

use crate::file::{FileContent, FileDescriptor};
use crate::value::{FieldMap, FieldValue, insert_field};
use crate::Error;
use bytes::Bytes;
use memchr::memmem;
use tracing::debug;

const CRLF: &[u8] = b"\r\n";
const HEADER_END: &[u8] = b"\r\n\r\n";
const DEFAULT_FILE_TYPE: &str = "application/octet-stream";

/// Decoded multipart body: text fields plus file descriptors
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MultipartBody {
    /// Text fields, in body order
    pub fields: FieldMap,
    /// File parts, in body order
    pub files: Vec<FileDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Preamble,
    Headers,
    Body,
    Done,
}

#[derive(Debug, Default)]
struct PartHeaders {
    name: Option<String>,
    filename: Option<String>,
    content_type: Option<String>,
}

/// A delimiter occurrence that satisfied both anchors.
struct Delimiter {
    /// Offset where the preceding part's content ends
    content_end: usize,
    /// Offset right after the delimiter line
    next: usize,
    /// Close delimiter (`--boundary--`)
    last: bool,
}

/// Multipart form data parser
pub struct MultipartParser {
    boundary: String,
}

impl MultipartParser {
    /// Create a parser for a known boundary
    pub fn new(boundary: impl Into<String>) -> Result<Self, Error> {
        let boundary = boundary.into();
        if boundary.is_empty() {
            return Err(Error::BadRequest("Empty multipart boundary".to_string()));
        }
        Ok(Self { boundary })
    }

    /// Create a new multipart parser from Content-Type header
    pub fn from_content_type(content_type: &str) -> Result<Self, Error> {
        // Example: "multipart/form-data; boundary=----WebKitFormBoundary7MA4YWxkTrZu0gW"
        let boundary = content_type
            .split(';')
            .find_map(|part| {
                let (key, value) = part.trim().split_once('=')?;
                key.trim()
                    .eq_ignore_ascii_case("boundary")
                    .then(|| value.trim().trim_matches('"').to_string())
            })
            .ok_or_else(|| Error::BadRequest("Missing boundary in Content-Type".to_string()))?;

        Self::new(boundary)
    }

    /// The boundary this parser splits on
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Parse multipart form data
    pub fn parse(&self, body: Bytes) -> Result<MultipartBody, Error> {
        let mut out = MultipartBody::default();
        if body.is_empty() {
            return Ok(out);
        }

        let delimiter = format!("--{}", self.boundary).into_bytes();
        let finder = memmem::Finder::new(&delimiter);

        let mut state = State::Preamble;
        let mut pos = 0;
        let mut headers = PartHeaders::default();

        while state != State::Done {
            match state {
                State::Preamble => {
                    let found = self
                        .next_delimiter(&body, &finder, delimiter.len(), 0, true)
                        .ok_or_else(|| {
                            Error::BadRequest("No multipart boundary found in body".to_string())
                        })?;
                    pos = found.next;
                    state = if found.last { State::Done } else { State::Headers };
                }
                State::Headers => {
                    let (block, next) = if body[pos..].starts_with(CRLF) {
                        (&body[pos..pos], pos + CRLF.len())
                    } else {
                        let end = memmem::find(&body[pos..], HEADER_END)
                            .map(|offset| pos + offset)
                            .ok_or_else(|| {
                                Error::BadRequest("Malformed multipart part headers".to_string())
                            })?;
                        (&body[pos..end], end + HEADER_END.len())
                    };
                    headers = parse_headers(block);
                    pos = next;
                    state = State::Body;
                }
                State::Body => {
                    let found = self
                        .next_delimiter(&body, &finder, delimiter.len(), pos, false)
                        .ok_or_else(|| {
                            Error::BadRequest(
                                "Multipart body is missing its closing boundary".to_string(),
                            )
                        })?;
                    let content = body.slice(pos..found.content_end);
                    emit_part(std::mem::take(&mut headers), content, &mut out)?;
                    pos = found.next;
                    state = if found.last { State::Done } else { State::Headers };
                }
                State::Done => {}
            }
        }

        Ok(out)
    }

    /// Find the next anchored delimiter at or after `from`.
    fn next_delimiter(
        &self,
        body: &[u8],
        finder: &memmem::Finder<'_>,
        delimiter_len: usize,
        from: usize,
        at_start_ok: bool,
    ) -> Option<Delimiter> {
        let mut search = from;
        while search < body.len() {
            let idx = search + finder.find(&body[search..])?;
            search = idx + 1;

            let after_crlf = idx >= CRLF.len() && &body[idx - CRLF.len()..idx] == CRLF;
            if !(after_crlf || (at_start_ok && idx == 0)) {
                continue;
            }

            let after = idx + delimiter_len;
            let content_end = if after_crlf {
                (idx - CRLF.len()).max(from)
            } else {
                idx
            };

            if body[after..].starts_with(b"--") {
                return Some(Delimiter {
                    content_end,
                    next: body.len(),
                    last: true,
                });
            }

            // transport padding before the line break
            let padded = after
                + body[after..]
                    .iter()
                    .take_while(|b| **b == b' ' || **b == b'\t')
                    .count();
            if body[padded..].starts_with(CRLF) {
                return Some(Delimiter {
                    content_end,
                    next: padded + CRLF.len(),
                    last: false,
                });
            }
            if padded == body.len() {
                // close delimiter without its trailing dashes
                return Some(Delimiter {
                    content_end,
                    next: body.len(),
                    last: true,
                });
            }
        }
        None
    }
}

fn emit_part(headers: PartHeaders, content: Bytes, out: &mut MultipartBody) -> Result<(), Error> {
    let name = headers
        .name
        .ok_or_else(|| Error::BadRequest("Missing field name in multipart part".to_string()))?;

    match headers.filename {
        Some(filename) => {
            debug!(field = %name, file = %filename, size = content.len(), "decoded multipart file part");
            out.files.push(FileDescriptor {
                key: name,
                name: filename,
                media_type: headers
                    .content_type
                    .unwrap_or_else(|| DEFAULT_FILE_TYPE.to_string()),
                size: content.len() as u64,
                content: FileContent::Copied(content),
            });
        }
        None => {
            debug!(field = %name, size = content.len(), "decoded multipart field part");
            let value = match std::str::from_utf8(&content) {
                Ok(text) => FieldValue::String(text.to_string()),
                Err(_) => FieldValue::Bytes(content),
            };
            insert_field(&mut out.fields, &name, value);
        }
    }
    Ok(())
}

fn parse_headers(block: &[u8]) -> PartHeaders {
    let mut headers = PartHeaders::default();
    let text = String::from_utf8_lossy(block);

    for line in text.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };
        let name = name.trim();
        if name.eq_ignore_ascii_case("content-disposition") {
            for param in split_params(value).into_iter().skip(1) {
                let Some((key, raw)) = param.split_once('=') else {
                    continue;
                };
                match key.trim().to_ascii_lowercase().as_str() {
                    "name" => headers.name = Some(unquote(raw.trim())),
                    "filename" => headers.filename = Some(unquote(raw.trim())),
                    _ => {}
                }
            }
        } else if name.eq_ignore_ascii_case("content-type") {
            headers.content_type = Some(value.trim().to_string());
        }
    }

    headers
}

/// Split a header value on `;`, ignoring separators inside quoted strings.
fn split_params(value: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '\\' if in_quotes => escaped = !escaped,
            '"' if !escaped => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                parts.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
        if c != '\\' {
            escaped = false;
        }
    }
    parts.push(&value[start..]);
    parts
}

fn unquote(value: &str) -> String {
    match value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\\\"", "\"").replace("\\\\", "\\"),
        None => value.to_string(),
    }
}
