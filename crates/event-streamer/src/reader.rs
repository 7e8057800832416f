// crates/event-streamer/src/reader.rs

//! Inbound side: read bytes, split lines, decode and dispatch.
//!
//! One reader task runs per streamer. Every complete line is handled
//! synchronously inside the task, so lines are dispatched strictly in
//! arrival order and a slow listener delays the next line.

use bytes::Bytes;
use event_core::{Dispatcher, StreamError};
use event_protocol::{decode_line, FieldNames, LineBuffer, ProtocolError};
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, trace, warn};

use crate::types::ClosedTx;

/// Size of a single read from the transport.
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Everything the reader needs to turn a line into a dispatch.
#[derive(Debug, Clone)]
pub(crate) struct Inbound {
    pub dispatcher: Dispatcher,
    pub fields: FieldNames,
    pub ignore_non_json: bool,
}

impl Inbound {
    /// Decode one line and dispatch it, or report why it could not be.
    pub fn handle_line(&self, line: Result<Bytes, ProtocolError>) {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                self.dispatcher.dispatch_error(&StreamError::from(err));
                return;
            }
        };

        if line.is_empty() {
            return;
        }

        match decode_line(&line, &self.fields) {
            Ok(message) => {
                trace!(event = ?message.event, args = message.arguments.len(), "received message");
                self.dispatcher.dispatch(&message);
            }
            Err(err @ ProtocolError::InvalidJson { .. }) if self.ignore_non_json => {
                trace!(error = %err, "ignoring non-JSON line");
            }
            Err(err) => {
                debug!(error = %err, "invalid inbound line");
                self.dispatcher.dispatch_error(&StreamError::from(err));
            }
        }
    }
}

/// Run the reader loop until the transport reaches end of stream or fails.
///
/// A trailing line without a delimiter is still dispatched at a clean end
/// of stream. After a read error the partial line is dropped. Read errors
/// belong to the transport and are only logged here.
pub(crate) async fn run_reader<R>(mut read_stream: R, inbound: Inbound, closed: ClosedTx)
where
    R: AsyncRead + Unpin,
{
    let mut lines = LineBuffer::new();
    let mut temp_buf = vec![0u8; READ_CHUNK_SIZE];

    loop {
        match read_stream.read(&mut temp_buf).await {
            Ok(0) => {
                debug!("transport reached end of stream");
                if let Some(line) = lines.finish() {
                    inbound.handle_line(line);
                }
                break;
            }
            Ok(n) => {
                lines.extend(&temp_buf[..n]);

                while let Some(line) = lines.next_line() {
                    inbound.handle_line(line);
                }
            }
            Err(e) => {
                warn!(
                    error = %e,
                    dropped = lines.pending(),
                    "transport read error, stopping reader"
                );
                break;
            }
        }
    }

    closed.send_replace(true);
}
