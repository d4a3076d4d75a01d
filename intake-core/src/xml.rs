//! XML body decoding
//!
//! The root element's children become fields. An element with child elements
//! becomes a keyed collection, repeated sibling names collect into a list and
//! a leaf element becomes its text.

use crate::value::{FieldMap, FieldValue};
use crate::Error;
use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;

#[derive(Default)]
struct Frame {
    name: String,
    children: FieldMap,
    text: String,
}

impl Frame {
    fn into_value(self) -> FieldValue {
        if self.children.is_empty() {
            FieldValue::String(self.text)
        } else {
            FieldValue::Map(self.children)
        }
    }
}

/// Parse an XML document into the fields under its root element
pub fn parse_xml_map(body: &[u8]) -> Result<FieldMap, Error> {
    let text = std::str::from_utf8(body)
        .map_err(|_| Error::BadRequest("XML body is not valid UTF-8".to_string()))?;
    let mut reader = Reader::from_str(text);
    let mut stack: Vec<Frame> = Vec::new();

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::BadRequest(format!("Failed to parse XML body: {}", e)))?;

        match event {
            Event::Start(start) => stack.push(Frame {
                name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
                ..Frame::default()
            }),
            Event::Empty(start) => {
                let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
                match stack.last_mut() {
                    Some(parent) => push_child(&mut parent.children, name, FieldValue::from("")),
                    None => return Ok(FieldMap::new()),
                }
            }
            Event::Text(text) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&text));
                }
            }
            Event::CData(data) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&data));
                }
            }
            Event::GeneralRef(entity) => {
                let ch = resolve_entity(&entity)?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push(ch);
                }
            }
            Event::End(_) => {
                let Some(frame) = stack.pop() else {
                    return Err(Error::BadRequest("Unbalanced XML end tag".to_string()));
                };
                match stack.last_mut() {
                    Some(parent) => {
                        let name = frame.name.clone();
                        push_child(&mut parent.children, name, frame.into_value());
                    }
                    None => return Ok(frame.children),
                }
            }
            Event::Eof => {
                return if stack.is_empty() {
                    Ok(FieldMap::new())
                } else {
                    Err(Error::BadRequest("Unexpected end of XML body".to_string()))
                };
            }
            _ => {}
        }
    }
}

fn push_child(children: &mut FieldMap, name: String, value: FieldValue) {
    match children.get_mut(&name) {
        Some(FieldValue::List(items)) => items.push(value),
        Some(existing) => {
            let first = std::mem::replace(existing, FieldValue::Null);
            *existing = FieldValue::List(vec![first, value]);
        }
        None => {
            children.insert(name, value);
        }
    }
}

fn resolve_entity(entity: &BytesRef<'_>) -> Result<char, Error> {
    let name = String::from_utf8_lossy(entity);
    let resolved = match name.as_ref() {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        other => other.strip_prefix('#').and_then(|code| {
            let number = match code.strip_prefix('x').or_else(|| code.strip_prefix('X')) {
                Some(hex) => u32::from_str_radix(hex, 16).ok(),
                None => code.parse().ok(),
            };
            number.and_then(char::from_u32)
        }),
    };
    resolved.ok_or_else(|| Error::BadRequest(format!("Unknown XML entity `&{};`", name)))
}
