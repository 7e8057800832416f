//! Error types for the event streamer.
//!
//! The errors that belong to the engine itself:
//! - an inbound line that is not JSON, or too long to buffer (reported on
//!   the error channel),
//! - outbound arguments that cannot be represented as JSON (returned to
//!   the caller of `emit`).
//!
//! Transport failures (write errors, closed streams) are not part of this
//! taxonomy; they stay with the transport.

use thiserror::Error;

/// Errors surfaced by the event streamer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    /// An inbound line could not be decoded.
    ///
    /// `line` is a bounded, lossy UTF-8 prefix of the offending line (empty
    /// when the line was too long to keep), `reason` the description.
    #[error("{line:?} is not valid JSON: {reason}")]
    InvalidMessage { line: String, reason: String },

    /// Outbound arguments are not representable as JSON.
    #[error("failed to serialize event: {0}")]
    Serialization(String),
}

impl StreamError {
    /// Convenience constructor for an `InvalidMessage` error.
    pub fn invalid_message(line: impl Into<String>, reason: impl Into<String>) -> Self {
        StreamError::InvalidMessage {
            line: line.into(),
            reason: reason.into(),
        }
    }

    /// True for errors raised while decoding inbound data.
    pub fn is_invalid_message(&self) -> bool {
        matches!(self, StreamError::InvalidMessage { .. })
    }
}
