// crates/event-streamer/tests/support/mod.rs
#![allow(dead_code)]

use std::time::Duration;

use event_streamer::{JsonEventStreamer, StreamerConfig};
use tokio::io::{
    duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::time::timeout;

pub const WAIT: Duration = Duration::from_secs(2);

/// The far end of an in-memory transport.
pub struct Peer {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl Peer {
    /// Write raw text to the streamer.
    pub async fn send(&mut self, text: &str) {
        self.writer.write_all(text.as_bytes()).await.expect("peer write");
        self.writer.flush().await.expect("peer flush");
    }

    /// Stop sending: the streamer sees end of stream.
    pub async fn close_write(&mut self) {
        self.writer.shutdown().await.expect("peer shutdown");
    }

    /// Next line written by the streamer, without its newline.
    pub async fn next_line(&mut self) -> Option<String> {
        timeout(WAIT, self.lines.next_line())
            .await
            .expect("timed out waiting for a line")
            .expect("peer read")
    }
}

pub fn connect(config: StreamerConfig) -> (JsonEventStreamer, Peer) {
    let (local, remote) = duplex(64 * 1024);
    let streamer = JsonEventStreamer::new(local, config);

    let (read_half, writer) = tokio::io::split(remote);
    let peer = Peer {
        lines: BufReader::new(read_half).lines(),
        writer,
    };

    (streamer, peer)
}

pub fn channel<T>() -> (UnboundedSender<T>, UnboundedReceiver<T>) {
    unbounded_channel()
}

pub async fn recv<T>(rx: &mut UnboundedReceiver<T>) -> T {
    timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for a dispatch")
        .expect("listener channel closed")
}
