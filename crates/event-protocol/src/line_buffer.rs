// crates/event-protocol/src/line_buffer.rs

//! Newline splitter for a raw byte stream.
//!
//! Bytes arrive from the transport in arbitrary chunks; [`LineBuffer`]
//! accumulates them and hands back complete lines:
//!
//! - the `\n` delimiter is stripped, and so is a `\r` right before it,
//! - each line is yielded exactly once, in arrival order,
//! - a partial line is never yielded until its delimiter arrives, or
//!   until [`LineBuffer::finish`] is called at end of stream,
//! - empty lines are yielded as empty buffers (callers decide to skip),
//! - a line longer than the maximum is dropped as a whole and reported
//!   once as [`ProtocolError::LineTooLong`].

use bytes::{Bytes, BytesMut};

use crate::json_codec::ProtocolError;
use crate::wire_types::{LINE_DELIMITER, MAX_LINE_LENGTH};

/// Accumulates bytes and splits them into lines.
#[derive(Debug)]
pub struct LineBuffer {
    buf: BytesMut,

    /// Prefix of `buf` already known to contain no delimiter.
    scanned: usize,

    max_line_length: usize,

    /// Bytes thrown away so far from an over-long line still in progress.
    /// `Some` while discarding up to the next delimiter.
    discarded: Option<usize>,
}

impl Default for LineBuffer {
    fn default() -> Self {
        LineBuffer::new()
    }
}

impl LineBuffer {
    /// Create a buffer with the default [`MAX_LINE_LENGTH`].
    pub fn new() -> Self {
        LineBuffer::with_max_line_length(MAX_LINE_LENGTH)
    }

    /// Create a buffer that discards lines longer than `max_line_length`.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        LineBuffer {
            buf: BytesMut::with_capacity(8 * 1024),
            scanned: 0,
            max_line_length,
            discarded: None,
        }
    }

    /// Append raw bytes read from the transport.
    pub fn extend(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Number of buffered bytes not yet returned as a line.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Pop the next complete line, if one is buffered.
    pub fn next_line(&mut self) -> Option<Result<Bytes, ProtocolError>> {
        let found = self.buf[self.scanned..]
            .iter()
            .position(|&b| b == LINE_DELIMITER)
            .map(|offset| self.scanned + offset);

        match found {
            Some(pos) => {
                let mut line = self.buf.split_to(pos + 1);
                self.scanned = 0;
                line.truncate(pos);

                if let Some(discarded) = self.discarded.take() {
                    return Some(Err(self.too_long(discarded + pos)));
                }

                Some(self.finish_line(line))
            }
            None => {
                if self.buf.len() > self.max_line_length {
                    // Over-long: drop it and skip to the next delimiter.
                    let dropped = self.buf.len();
                    *self.discarded.get_or_insert(0) += dropped;
                    self.buf.clear();
                    self.scanned = 0;
                } else {
                    self.scanned = self.buf.len();
                }
                None
            }
        }
    }

    /// Flush a trailing line that had no delimiter, at end of stream.
    pub fn finish(&mut self) -> Option<Result<Bytes, ProtocolError>> {
        self.scanned = 0;

        if let Some(discarded) = self.discarded.take() {
            let total = discarded + self.buf.len();
            self.buf.clear();
            return Some(Err(self.too_long(total)));
        }

        if self.buf.is_empty() {
            return None;
        }

        let line = self.buf.split();
        Some(self.finish_line(line))
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn finish_line(&self, mut line: BytesMut) -> Result<Bytes, ProtocolError> {
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }

        if line.len() > self.max_line_length {
            return Err(self.too_long(line.len()));
        }

        Ok(line.freeze())
    }

    fn too_long(&self, length: usize) -> ProtocolError {
        ProtocolError::LineTooLong {
            length,
            max: self.max_line_length,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(buffer: &mut LineBuffer) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        while let Some(line) = buffer.next_line() {
            lines.push(line.unwrap().to_vec());
        }
        lines
    }

    #[test]
    fn test_splits_complete_lines() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"one\ntwo\nthr");

        assert_eq!(drain(&mut buffer), vec![b"one".to_vec(), b"two".to_vec()]);
        assert_eq!(buffer.pending(), 3);

        buffer.extend(b"ee\n");
        assert_eq!(drain(&mut buffer), vec![b"three".to_vec()]);
        assert_eq!(buffer.pending(), 0);
    }

    #[test]
    fn test_partial_line_waits_for_delimiter() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"{\"event\":");
        assert!(buffer.next_line().is_none());
        buffer.extend(b"\"x\"}");
        assert!(buffer.next_line().is_none());
        buffer.extend(b"\n");
        assert_eq!(drain(&mut buffer), vec![b"{\"event\":\"x\"}".to_vec()]);
    }

    #[test]
    fn test_strips_crlf_and_keeps_empty_lines() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"a\r\n\nb\r\n");
        assert_eq!(
            drain(&mut buffer),
            vec![b"a".to_vec(), Vec::new(), b"b".to_vec()]
        );
    }

    #[test]
    fn test_finish_flushes_trailing_line() {
        let mut buffer = LineBuffer::new();
        buffer.extend(b"first\nlast");
        assert_eq!(drain(&mut buffer), vec![b"first".to_vec()]);

        let last = buffer.finish().unwrap().unwrap();
        assert_eq!(&last[..], b"last");
        assert!(buffer.finish().is_none());
    }

    #[test]
    fn test_over_long_line_is_reported_once_and_skipped() {
        let mut buffer = LineBuffer::with_max_line_length(4);
        buffer.extend(b"abcdef");
        assert!(buffer.next_line().is_none());
        assert_eq!(buffer.pending(), 0);

        buffer.extend(b"gh\nok\n");
        match buffer.next_line() {
            Some(Err(ProtocolError::LineTooLong { length, max })) => {
                assert_eq!(length, 8);
                assert_eq!(max, 4);
            }
            other => panic!("Expected LineTooLong, got {other:?}"),
        }
        assert_eq!(drain(&mut buffer), vec![b"ok".to_vec()]);
    }

    #[test]
    fn test_over_long_complete_line() {
        let mut buffer = LineBuffer::with_max_line_length(2);
        buffer.extend(b"abc\n");
        assert!(matches!(
            buffer.next_line(),
            Some(Err(ProtocolError::LineTooLong { length: 3, max: 2 }))
        ));
    }
}
