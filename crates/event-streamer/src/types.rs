//! Shared types for the streamer tasks.
//!
//! This module defines the channel between the streamer handle and its
//! writer task. Lines on this channel are fully encoded, newline
//! terminated JSON text.

use tokio::sync::{mpsc, watch};

/// Encoded lines from `emit` to the writer task.
pub type OutboundTx = mpsc::UnboundedSender<String>;
pub type OutboundRx = mpsc::UnboundedReceiver<String>;

/// Set to `true` by the reader task once the transport has no more input.
pub type ClosedTx = watch::Sender<bool>;
pub type ClosedRx = watch::Receiver<bool>;
