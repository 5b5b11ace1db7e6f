//! XML encoding of problem members.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use serde_json::{Map, Value};

use crate::error::EncodeError;

/// Namespace of the `problem` element.
pub const PROBLEM_NAMESPACE: &str = "urn:ietf:rfc:7807";

/// Standard XML declaration written ahead of every XML problem body.
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Encodes `members` as `<problem xmlns="urn:ietf:rfc:7807">...</problem>`.
///
/// Every member becomes a child element in map order. Nested objects become
/// nested elements, arrays repeat the element once per item and nulls are
/// omitted.
///
/// # Errors
/// Returns `EncodeError::InvalidName` if a member name is not a valid XML
/// element name, or `EncodeError::Io` if the XML writer fails.
pub fn encode_problem(members: &Map<String, Value>) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new(Vec::new());
    writer.write_event(Event::Start(
        BytesStart::new("problem").with_attributes([("xmlns", PROBLEM_NAMESPACE)]),
    ))?;
    for (name, value) in members {
        write_member(&mut writer, name, value)?;
    }
    writer.write_event(Event::End(BytesEnd::new("problem")))?;
    Ok(writer.into_inner())
}

fn write_member<W: Write>(
    writer: &mut Writer<W>,
    name: &str,
    value: &Value,
) -> Result<(), EncodeError> {
    if !is_element_name(name) {
        return Err(EncodeError::InvalidName(name.to_owned()));
    }
    match value {
        Value::Null => {}
        Value::Bool(b) => write_text(writer, name, if *b { "true" } else { "false" })?,
        Value::Number(n) => write_text(writer, name, &n.to_string())?,
        Value::String(s) => write_text(writer, name, s)?,
        Value::Array(items) => {
            for item in items {
                write_member(writer, name, item)?;
            }
        }
        Value::Object(fields) => {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            for (field, inner) in fields {
                write_member(writer, field, inner)?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
    }
    Ok(())
}

/// Element names start with a letter or `_` and continue with letters,
/// digits, `-`, `_` or `.`. Colons are rejected since no prefixes are bound.
fn is_element_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

fn write_text<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), EncodeError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}
