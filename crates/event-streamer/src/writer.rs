//! Outbound side: the single task that writes to the transport.
//!
//! `emit` never touches the transport; it queues an encoded line on an
//! unbounded channel. This task is the only writer, so lines can't
//! interleave and break the one-object-per-line framing.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use crate::types::OutboundRx;

/// Consume queued lines and write them to the transport.
///
/// Lines already queued together are written back to back and flushed
/// once. When the channel closes (streamer closed or dropped), remaining
/// lines are drained and the write half is shut down.
pub(crate) async fn run_writer<W>(mut write_stream: W, mut out_rx: OutboundRx)
where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = out_rx.recv().await {
        if let Err(e) = write_batch(&mut write_stream, &line, &mut out_rx).await {
            warn!(error = %e, "transport write error, stopping writer");
            return;
        }
    }

    if let Err(e) = write_stream.shutdown().await {
        debug!(error = %e, "transport shutdown failed");
    }
}

async fn write_batch<W>(
    write_stream: &mut W,
    first: &str,
    out_rx: &mut OutboundRx,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    write_stream.write_all(first.as_bytes()).await?;

    while let Ok(line) = out_rx.try_recv() {
        write_stream.write_all(line.as_bytes()).await?;
    }

    write_stream.flush().await
}
