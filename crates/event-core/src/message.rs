//! Message type used by the event dispatch core.
//!
//! A [`Message`] is one event occurrence: an optional event name plus an
//! ordered list of JSON arguments. It is **transport-agnostic**; the JSON
//! line encoding lives in the `event-protocol` crate.

use serde_json::Value;

/// A single event occurrence, either decoded from the wire or built
/// locally by `emit`.
///
/// `event` is `None` when the wire object had no event field (or a
/// non-string one). Dispatching such a message still reaches observe-all
/// listeners, but is a no-op for named listeners.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Message {
    /// Event name.
    pub event: Option<String>,

    /// Positional arguments, in order. Empty means "no arguments field".
    pub arguments: Vec<Value>,
}

impl Message {
    /// Build a message for a named event.
    pub fn new(event: impl Into<String>, arguments: Vec<Value>) -> Self {
        Message {
            event: Some(event.into()),
            arguments,
        }
    }

    /// Build a message that carries no event name.
    pub fn unnamed(arguments: Vec<Value>) -> Self {
        Message {
            event: None,
            arguments,
        }
    }

    /// Event name as a string slice, if present.
    pub fn event_name(&self) -> Option<&str> {
        self.event.as_deref()
    }

    /// True when the message has a usable (present, non-empty) event name.
    pub fn has_event_name(&self) -> bool {
        matches!(self.event.as_deref(), Some(name) if !name.is_empty())
    }
}
