//! event-protocol
//!
//! Wire-level encoding/decoding for the event streamer.
//!
//! This crate is responsible for turning logical event messages
//! (`event_core::Message`) into line-delimited JSON and back again.
//!
//! - [`json_codec`]  : one message <-> one JSON line
//! - [`line_buffer`] : raw byte stream -> newline-delimited lines
//! - [`wire_types`]  : field names and framing constants

pub mod wire_types;
pub mod json_codec;
pub mod line_buffer;

pub use json_codec::{
    ProtocolError,
    decode_line,
    encode_message,
    message_from_value,
    to_arguments,
};

pub use line_buffer::LineBuffer;
pub use wire_types::FieldNames;
