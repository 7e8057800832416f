//! Low-level wire constants and field naming.
//!
//! This module defines:
//! - The default keys used for the event name and argument list.
//! - [`FieldNames`], the (configurable) pair of keys actually in use.
//! - Line framing constants.
//!
//! The actual encode/decode logic lives in `json_codec`.

/// Default key carrying the event name.
pub const DEFAULT_EVENT_PROPERTY: &str = "event";

/// Default key carrying the argument list.
pub const DEFAULT_ARGUMENTS_PROPERTY: &str = "arguments";

/// Every message on the wire is terminated by exactly one of these.
pub const LINE_DELIMITER: u8 = b'\n';

/// Maximum length of a single line (16 MB), excluding the delimiter.
///
/// Longer lines are discarded by the line buffer rather than
/// accumulated without bound.
pub const MAX_LINE_LENGTH: usize = 16 * 1024 * 1024;

/// Bytes of an offending line kept in a decode error.
pub const ERROR_LINE_PREVIEW: usize = 256;

/// Keys used to read and write the two fields of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldNames {
    /// Key of the event name field.
    pub event: String,

    /// Key of the argument list field.
    pub arguments: String,
}

impl FieldNames {
    pub fn new(event: impl Into<String>, arguments: impl Into<String>) -> Self {
        FieldNames {
            event: event.into(),
            arguments: arguments.into(),
        }
    }
}

impl Default for FieldNames {
    fn default() -> Self {
        FieldNames::new(DEFAULT_EVENT_PROPERTY, DEFAULT_ARGUMENTS_PROPERTY)
    }
}
