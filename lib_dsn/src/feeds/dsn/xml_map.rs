//! # XML to Mapping Conversion
//!
//! Converts an XML document into a nested `serde_json::Value` so the feed
//! models can walk it the same way the rest of the crate walks JSON payloads.
//!
//! ## Mapping rules:
//! - The document becomes `{ "<root>": <element> }`.
//! - Attributes become keys prefixed with `@` (`<dish name="DSS14">` →
//!   `{"@name": "DSS14"}`).
//! - Child elements become keys named after the tag. A tag seen once maps to a
//!   single value; a tag repeated under the same parent maps to an array.
//! - An element with neither attributes nor children maps to its text (or
//!   `null` when empty). Text mixed with attributes or children lands under
//!   `#text`.
//!
//! The single-versus-array ambiguity in the second-to-last rule is resolved by
//! [`as_sequence`], which every caller uses to read repeatable children.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde_json::{Map, Value};

use crate::error::DsnError;

/// Prefix applied to attribute keys.
pub const ATTR_PREFIX: &str = "@";
/// Key holding the text content of an element that also has attributes or children.
pub const TEXT_KEY: &str = "#text";

/// An element being assembled while its end tag has not been seen yet.
struct Frame {
    name: String,
    map: Map<String, Value>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>) -> Result<Self, DsnError> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| DsnError::Parse(format!("element name is not UTF-8: {}", e)))?
            .to_string();

        let mut map = Map::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| DsnError::Parse(format!("bad attribute in <{}>: {}", name, e)))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| DsnError::Parse(format!("attribute name is not UTF-8: {}", e)))?;
            let value = attr
                .unescape_value()
                .map_err(|e| DsnError::Parse(format!("bad attribute value in <{}>: {}", name, e)))?;
            map.insert(format!("{}{}", ATTR_PREFIX, key), Value::String(value.into_owned()));
        }

        Ok(Self { name, map, text: String::new() })
    }

    fn close(self) -> (String, Value) {
        let text = self.text.trim();
        let value = if self.map.is_empty() {
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        } else {
            let mut map = self.map;
            if !text.is_empty() {
                map.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
            }
            Value::Object(map)
        };
        (self.name, value)
    }
}

/// Inserts a child under `name`, promoting an existing single value to an array.
fn insert_child(map: &mut Map<String, Value>, name: String, value: Value) {
    match map.get_mut(&name) {
        None => {
            map.insert(name, value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

/// Attaches a finished element to its parent, or makes it the document root.
fn attach(stack: &mut [Frame], root: &mut Option<Value>, frame: Frame) -> Result<(), DsnError> {
    let (name, value) = frame.close();
    match stack.last_mut() {
        Some(parent) => insert_child(&mut parent.map, name, value),
        None => {
            if root.is_some() {
                return Err(DsnError::Parse(format!(
                    "unexpected second root element <{}>",
                    name
                )));
            }
            let mut doc = Map::new();
            doc.insert(name, value);
            *root = Some(Value::Object(doc));
        }
    }
    Ok(())
}

/// Parses an XML document into a nested mapping.
///
/// # Errors
/// `Parse` on malformed XML, mismatched tags, an empty document, trailing
/// content after the root element, or a document that ends mid-element.
pub fn parse(xml: &str) -> Result<Value, DsnError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(DsnError::Parse("content after the root element".into()));
                }
                stack.push(Frame::open(&e)?);
            }
            Event::Empty(e) => {
                if stack.is_empty() && root.is_some() {
                    return Err(DsnError::Parse("content after the root element".into()));
                }
                let frame = Frame::open(&e)?;
                attach(&mut stack, &mut root, frame)?;
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| DsnError::Parse("closing tag without an open element".into()))?;
                attach(&mut stack, &mut root, frame)?;
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| DsnError::Parse(format!("bad text content: {}", e)))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions and doctypes carry no data.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DsnError::Parse(format!(
            "document ended inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| DsnError::Parse("document has no root element".into()))
}

/// Normalizes a repeatable child to a sequence.
///
/// A missing or `null` child yields no items, an array yields its elements,
/// and any single value yields a one-element sequence.
pub fn as_sequence(value: Option<&Value>) -> Vec<&Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(single) => vec![single],
    }
}

/// Reads an attribute (`@name`) of an element as a string slice.
pub fn attr<'a>(element: &'a Value, name: &str) -> Option<&'a str> {
    element
        .get(format!("{}{}", ATTR_PREFIX, name))
        .and_then(Value::as_str)
}

/// Reads the text of a child element, whether it was mapped to a plain
/// string or to an object carrying `#text`.
pub fn child_text<'a>(element: &'a Value, name: &str) -> Option<&'a str> {
    match element.get(name)? {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map.get(TEXT_KEY).and_then(Value::as_str),
        _ => None,
    }
}
