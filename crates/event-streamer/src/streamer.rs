//! The protocol engine: a named-event emitter bound to a byte transport.
//!
//! A [`JsonEventStreamer`] owns one duplex transport for its whole life:
//!
//! ```text
//! transport ──► reader task ──► LineBuffer ──► decode_line ──► Dispatcher
//!                                                               ├─ observe-all listeners
//!                                                               └─ named listeners
//!
//! emit() ──► encode_message ──► OutboundTx ──► writer task ──► transport
//!        └─(emit_local_events)──► Dispatcher
//! ```
//!
//! Construction spawns both tasks, so it must happen inside a tokio
//! runtime. There is no start call, no handshake and no reconnection.

use std::sync::Arc;

use event_core::{Dispatcher, ListenerId, Message, StreamError, Value};
use event_protocol::{encode_message, to_arguments, FieldNames};
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::config::StreamerConfig;
use crate::reader::{self, Inbound};
use crate::types::{ClosedRx, OutboundTx};
use crate::writer;

/// Bidirectional line-delimited JSON event stream.
pub struct JsonEventStreamer {
    config: StreamerConfig,
    fields: FieldNames,
    dispatcher: Dispatcher,

    /// `None` once `close` has started.
    out_tx: Option<OutboundTx>,
    closed_rx: ClosedRx,

    reader_handle: Option<JoinHandle<()>>,
    writer_handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for JsonEventStreamer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonEventStreamer")
            .field("config", &self.config)
            .field("dispatcher", &self.dispatcher)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl JsonEventStreamer {
    /// Bind a streamer to a duplex transport.
    ///
    /// The transport is split into a read half (consumed by the reader
    /// task) and a write half (owned by the writer task). Reading starts
    /// immediately.
    pub fn new<T>(transport: T, config: StreamerConfig) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::new_with(transport, config, |_| {})
    }

    /// Bind a streamer using the default configuration.
    pub fn with_defaults<T>(transport: T) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
    {
        Self::new(transport, StreamerConfig::default())
    }

    /// Like [`new`](Self::new), running `setup` before the reader starts.
    ///
    /// On a multi-threaded runtime the reader may dispatch lines as soon as
    /// it is spawned; listeners registered in `setup` are guaranteed to see
    /// the very first line.
    pub fn new_with<T, F>(transport: T, config: StreamerConfig, setup: F) -> Self
    where
        T: AsyncRead + AsyncWrite + Send + 'static,
        F: FnOnce(&Self),
    {
        let (read_half, write_half) = tokio::io::split(transport);
        Self::from_split_with(read_half, write_half, config, setup)
    }

    /// Bind a streamer to separate read and write halves, e.g.
    /// `TcpStream::into_split` or a child process' stdout/stdin.
    pub fn from_split<R, W>(read_stream: R, write_stream: W, config: StreamerConfig) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::from_split_with(read_stream, write_stream, config, |_| {})
    }

    /// Like [`from_split`](Self::from_split), running `setup` before the
    /// reader starts.
    pub fn from_split_with<R, W, F>(
        read_stream: R,
        write_stream: W,
        config: StreamerConfig,
        setup: F,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
        F: FnOnce(&Self),
    {
        let fields = config.field_names();
        let dispatcher = Dispatcher::new();

        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (closed_tx, closed_rx) = watch::channel(false);

        let writer_handle = tokio::spawn(writer::run_writer(write_stream, out_rx));

        let mut streamer = JsonEventStreamer {
            config,
            fields,
            dispatcher,
            out_tx: Some(out_tx),
            closed_rx,
            reader_handle: None,
            writer_handle: Some(writer_handle),
        };

        setup(&streamer);

        let inbound = Inbound {
            dispatcher: streamer.dispatcher.clone(),
            fields: streamer.fields.clone(),
            ignore_non_json: streamer.config.ignore_non_json,
        };
        streamer.reader_handle = Some(tokio::spawn(reader::run_reader(
            read_stream,
            inbound,
            closed_tx,
        )));

        debug!(config = ?streamer.config, "event streamer started");
        streamer
    }

    /// The configuration this streamer was built with.
    pub fn config(&self) -> &StreamerConfig {
        &self.config
    }

    // -------------------------------------------------------------------------
    // Outbound
    // -------------------------------------------------------------------------

    /// Send `event` with `arguments` to the peer.
    ///
    /// The arguments key is left off the wire when `arguments` is empty.
    /// With `emit_local_events`, this streamer's own observe-all and named
    /// listeners are also invoked before `emit` returns.
    pub fn emit(&self, event: &str, arguments: Vec<Value>) -> Result<(), StreamError> {
        self.emit_message(&Message::new(event, arguments))
    }

    /// Like [`emit`](Self::emit), converting typed arguments to JSON first.
    ///
    /// Returns [`StreamError::Serialization`] if any argument cannot be
    /// represented as JSON; nothing is written in that case.
    pub fn emit_serialize<T: Serialize>(&self, event: &str, arguments: &[T]) -> Result<(), StreamError> {
        let arguments = to_arguments(arguments)?;
        self.emit(event, arguments)
    }

    /// Send an already built message.
    pub fn emit_message(&self, message: &Message) -> Result<(), StreamError> {
        let line = encode_message(message, &self.fields)?;
        trace!(event = ?message.event, bytes = line.len(), "queueing message");
        self.queue_line(line);

        if self.config.emit_local_events {
            self.dispatcher.dispatch(message);
        }

        Ok(())
    }

    fn queue_line(&self, line: String) {
        let Some(out_tx) = &self.out_tx else {
            debug!("streamer closed, dropping outbound line");
            return;
        };

        if out_tx.send(line).is_err() {
            debug!("writer stopped, dropping outbound line");
        }
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Listen for one event name. The callback receives the arguments.
    pub fn on<F>(&self, event: &str, callback: F) -> ListenerId
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.dispatcher.with_registry(|r| r.on(event, Arc::new(callback)))
    }

    /// Listen for the next occurrence of one event name only.
    pub fn once<F>(&self, event: &str, callback: F) -> ListenerId
    where
        F: Fn(&[Value]) + Send + Sync + 'static,
    {
        self.dispatcher.with_registry(|r| r.once(event, Arc::new(callback)))
    }

    /// Listen for every dispatched message, whatever its event name.
    ///
    /// The callback receives `(event, arguments)`. Locally emitted events
    /// only reach it when `emit_local_events` is set.
    pub fn on_all<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(Option<&str>, &[Value]) + Send + Sync + 'static,
    {
        self.dispatcher.with_registry(|r| r.on_all(Arc::new(callback)))
    }

    /// Remove an observe-all listener. Unknown handles are ignored.
    pub fn remove_all_listener(&self, id: ListenerId) -> bool {
        self.dispatcher.with_registry(|r| r.remove_all_listener(id))
    }

    /// Listen on the error channel (lines that are not JSON, over-long lines).
    pub fn on_error<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&StreamError) + Send + Sync + 'static,
    {
        self.dispatcher.with_registry(|r| r.on_error(Arc::new(callback)))
    }

    /// Remove any listener by handle.
    pub fn off(&self, id: ListenerId) -> bool {
        self.dispatcher.with_registry(|r| r.off(id))
    }

    /// Remove the named listeners of `event`, or of every event for `None`.
    pub fn remove_all_listeners(&self, event: Option<&str>) {
        self.dispatcher.with_registry(|r| r.remove_all_listeners(event))
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.dispatcher.with_registry(|r| r.listener_count(event))
    }

    pub fn event_names(&self) -> Vec<String> {
        self.dispatcher.with_registry(|r| r.event_names())
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// True once the reader has seen the end of the transport's input.
    pub fn is_closed(&self) -> bool {
        *self.closed_rx.borrow()
    }

    /// Wait until the transport's input ends (EOF or read error).
    ///
    /// Every line received before that point has been dispatched when this
    /// returns.
    pub async fn finished(&self) {
        let mut closed_rx = self.closed_rx.clone();
        // An error means the reader task is gone, which is just as final.
        let _ = closed_rx.wait_for(|closed| *closed).await;
    }

    /// Detach from the transport.
    ///
    /// Already queued lines are written and flushed, the write half is shut
    /// down, and the reader stops. No listener is invoked after this returns.
    pub async fn close(mut self) {
        self.out_tx.take();

        if let Some(reader) = self.reader_handle.take() {
            reader.abort();
            let _ = reader.await;
        }

        if let Some(writer) = self.writer_handle.take() {
            if let Err(e) = writer.await {
                debug!(error = %e, "writer task ended abnormally");
            }
        }
    }
}

impl Drop for JsonEventStreamer {
    fn drop(&mut self) {
        // The writer drains and exits on its own once `out_tx` is dropped.
        if let Some(reader) = self.reader_handle.take() {
            reader.abort();
        }
    }
}
