//! JSON line encoding/decoding for event messages.
//!
//! This module converts between:
//! - one line of UTF-8 JSON text
//! - a high-level `event_core::Message`
//!
//! Framing model (one message per line):
//!
//! ```text
//! {"<event>":"example","<arguments>":[1,"a",{"b":"c"}]}\n
//! {"<event>":"example"}\n
//! ```
//!
//! - `<event>` / `<arguments>` are the configured [`FieldNames`]
//!   (default `event` / `arguments`).
//! - The arguments key is written only when there is at least one
//!   argument.
//! - No other top-level keys are defined; the decoder ignores extras.
//!
//! Decoding is lenient about shape, strict about syntax:
//! - text that is not JSON -> [`ProtocolError::InvalidJson`],
//! - a JSON value that is not an object -> message with no event name
//!   and no arguments,
//! - a missing or non-string event field -> no event name,
//! - a missing arguments field, or one that is `null`, `false`, `0` or
//!   `""` -> no arguments,
//! - any other arguments field that is not an array -> one argument.
//!
//! NOTE: This module handles **one message per line buffer**; splitting a
//! byte stream into lines is the job of [`crate::line_buffer`].

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use event_core::{Message, StreamError};

use crate::wire_types::{FieldNames, ERROR_LINE_PREVIEW, LINE_DELIMITER};

/// Errors that can arise when encoding/decoding a line.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The line is not a syntactically valid JSON value.
    #[error("{line:?} is not valid JSON: {reason}")]
    InvalidJson { line: String, reason: String },

    /// A value could not be converted to JSON.
    #[error("failed to serialize event: {0}")]
    Serialization(#[source] serde_json::Error),

    /// A line exceeded the configured maximum length and was discarded.
    #[error("line of {length} bytes exceeds the maximum of {max} bytes")]
    LineTooLong { length: usize, max: usize },
}

impl From<ProtocolError> for StreamError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidJson { line, reason } => {
                StreamError::InvalidMessage { line, reason }
            }
            ProtocolError::Serialization(e) => StreamError::Serialization(e.to_string()),
            // The line itself is gone; only its size is known.
            ProtocolError::LineTooLong { length, max } => StreamError::InvalidMessage {
                line: String::new(),
                reason: format!("line of {length} bytes exceeds the maximum of {max} bytes"),
            },
        }
    }
}

// ============================================================================
// ENCODE: message → line
// ============================================================================

/// Borrowed view of a message, serialized with the configured keys.
///
/// Serializing through this view avoids cloning the arguments and pins
/// the key order: event first, then arguments.
struct WireMessage<'a> {
    fields: &'a FieldNames,
    message: &'a Message,
}

impl Serialize for WireMessage<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let has_arguments = !self.message.arguments.is_empty();
        let len = usize::from(self.message.event.is_some()) + usize::from(has_arguments);

        let mut map = serializer.serialize_map(Some(len))?;
        if let Some(event) = &self.message.event {
            map.serialize_entry(&self.fields.event, event)?;
        }
        if has_arguments {
            map.serialize_entry(&self.fields.arguments, &self.message.arguments)?;
        }
        map.end()
    }
}

/// Encode a message as one JSON line, including the trailing newline.
///
/// A message without an event name is written without the event key.
pub fn encode_message(message: &Message, fields: &FieldNames) -> Result<String, ProtocolError> {
    let mut line = serde_json::to_string(&WireMessage { fields, message })
        .map_err(ProtocolError::Serialization)?;
    line.push(LINE_DELIMITER as char);
    Ok(line)
}

/// Convert typed Rust values into JSON arguments.
///
/// This is where serialization can actually fail, e.g. a map whose keys
/// are not strings, or a `Serialize` impl that returns an error.
pub fn to_arguments<T: Serialize>(args: &[T]) -> Result<Vec<Value>, ProtocolError> {
    args.iter()
        .map(|arg| serde_json::to_value(arg).map_err(ProtocolError::Serialization))
        .collect()
}

// ============================================================================
// DECODE: line → message
// ============================================================================

/// Decode a single line (without its delimiter) into a `Message`.
pub fn decode_line(line: &[u8], fields: &FieldNames) -> Result<Message, ProtocolError> {
    let value: Value = serde_json::from_slice(line).map_err(|e| ProtocolError::InvalidJson {
        line: line_preview(line),
        reason: e.to_string(),
    })?;

    Ok(message_from_value(value, fields))
}

/// Lossy UTF-8 copy of at most [`ERROR_LINE_PREVIEW`] bytes of `line`,
/// with `…` appended when it was cut.
fn line_preview(line: &[u8]) -> String {
    if line.len() <= ERROR_LINE_PREVIEW {
        return String::from_utf8_lossy(line).into_owned();
    }

    let mut preview = String::from_utf8_lossy(&line[..ERROR_LINE_PREVIEW]).into_owned();
    preview.push('…');
    preview
}

/// Interpret an already-parsed JSON value as a `Message`.
pub fn message_from_value(value: Value, fields: &FieldNames) -> Message {
    match value {
        Value::Object(object) => message_from_object(object, fields),
        _ => Message::unnamed(Vec::new()),
    }
}

fn message_from_object(mut object: Map<String, Value>, fields: &FieldNames) -> Message {
    let event = match object.remove(&fields.event) {
        Some(Value::String(name)) => Some(name),
        _ => None,
    };

    let arguments = match object.remove(&fields.arguments) {
        None => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) if is_falsy(&other) => Vec::new(),
        Some(other) => vec![other],
    };

    Message { event, arguments }
}

/// `null`, `false`, zero and `""` count as "no arguments".
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_without_arguments_omits_key() {
        let line = encode_message(&Message::new("example", vec![]), &FieldNames::default()).unwrap();
        assert_eq!(line, "{\"event\":\"example\"}\n");
    }

    #[test]
    fn test_encode_with_arguments_keeps_order() {
        let msg = Message::new("example", vec![json!(1), json!("a"), json!({"b": "c"})]);
        let line = encode_message(&msg, &FieldNames::default()).unwrap();
        assert_eq!(line, "{\"event\":\"example\",\"arguments\":[1,\"a\",{\"b\":\"c\"}]}\n");
    }

    #[test]
    fn test_encode_unnamed_message() {
        let line = encode_message(&Message::unnamed(vec![json!(null)]), &FieldNames::default()).unwrap();
        assert_eq!(line, "{\"arguments\":[null]}\n");
    }

    #[test]
    fn test_decode_concrete_line() {
        let msg = decode_line(
            br#"{"event":"example","arguments":[1,"a",{"b":"c"}]}"#,
            &FieldNames::default(),
        )
        .unwrap();
        assert_eq!(msg.event_name(), Some("example"));
        assert_eq!(msg.arguments, vec![json!(1), json!("a"), json!({"b": "c"})]);
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = decode_line(b"test", &FieldNames::default()).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson { ref line, .. } if line == "test"));
        assert!(err.to_string().contains("is not valid JSON"));
    }

    #[test]
    fn test_decode_invalid_utf8_is_invalid_json() {
        let err = decode_line(&[b'"', 0xff, 0xfe, b'"'], &FieldNames::default()).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidJson { .. }));
    }

    #[test]
    fn test_decode_shapes() {
        let fields = FieldNames::default();

        let non_object = decode_line(b"[1,2]", &fields).unwrap();
        assert_eq!(non_object, Message::unnamed(vec![]));

        let numeric_event = decode_line(br#"{"event":5}"#, &fields).unwrap();
        assert_eq!(numeric_event.event, None);

        let null_args = decode_line(br#"{"event":"x","arguments":null}"#, &fields).unwrap();
        assert!(null_args.arguments.is_empty());

        let scalar_args = decode_line(br#"{"event":"x","arguments":"solo"}"#, &fields).unwrap();
        assert_eq!(scalar_args.arguments, vec![json!("solo")]);

        let object_args = decode_line(br#"{"event":"x","arguments":{"a":1}}"#, &fields).unwrap();
        assert_eq!(object_args.arguments, vec![json!({"a": 1})]);

        let extra = decode_line(br#"{"event":"x","id":7}"#, &fields).unwrap();
        assert_eq!(extra, Message::new("x", vec![]));
    }

    #[test]
    fn test_decode_falsy_scalar_arguments_are_empty() {
        let fields = FieldNames::default();

        for raw in ["0", "0.0", "false", "\"\""] {
            let line = format!(r#"{{"event":"x","arguments":{raw}}}"#);
            let msg = decode_line(line.as_bytes(), &fields).unwrap();
            assert!(msg.arguments.is_empty(), "arguments {raw} gave {:?}", msg.arguments);
        }

        let truthy = decode_line(br#"{"event":"x","arguments":true}"#, &fields).unwrap();
        assert_eq!(truthy.arguments, vec![json!(true)]);

        let empty_array = decode_line(br#"{"event":"x","arguments":[]}"#, &fields).unwrap();
        assert!(empty_array.arguments.is_empty());
    }

    #[test]
    fn test_invalid_json_error_keeps_a_bounded_preview() {
        let long = vec![b'x'; ERROR_LINE_PREVIEW * 4];
        let err = decode_line(&long, &FieldNames::default()).unwrap_err();

        let ProtocolError::InvalidJson { line, .. } = &err else {
            panic!("Expected InvalidJson, got {err:?}");
        };
        assert_eq!(line.len(), ERROR_LINE_PREVIEW + '…'.len_utf8());
        assert!(line.ends_with('…'));
        assert!(err.to_string().len() < ERROR_LINE_PREVIEW * 2);
    }

    #[test]
    fn test_line_too_long_becomes_invalid_message() {
        let err: StreamError = ProtocolError::LineTooLong { length: 10, max: 4 }.into();
        assert!(err.is_invalid_message());
        assert!(err.to_string().contains("line of 10 bytes exceeds the maximum of 4 bytes"));
    }

    #[test]
    fn test_to_arguments_rejects_non_string_keys() {
        let mut map = std::collections::BTreeMap::new();
        map.insert(vec![1u8], "value");
        let err = to_arguments(&[map]).unwrap_err();
        assert!(matches!(err, ProtocolError::Serialization(_)));

        let converted: StreamError = err.into();
        assert!(matches!(converted, StreamError::Serialization(_)));
    }
}
