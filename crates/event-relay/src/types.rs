//! Shared types for the relay server.
//!
//! This module defines:
//! - `ClientId`: a lightweight handle for connected clients
//! - `ClientRegistry`: every connected client's streamer
//! - `HubRequest` and the channel from clients to the hub loop

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use event_core::Message;
use event_streamer::JsonEventStreamer;
use tokio::sync::mpsc;
use tokio::sync::RwLock;

/// Identifier for a connected client.
///
/// Unique over the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientId(pub u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A connected client, as the hub sees it.
pub type ClientHandle = Arc<JsonEventStreamer>;

/// Registry of connected clients.
pub type ClientRegistry = Arc<RwLock<HashMap<ClientId, ClientHandle>>>;

/// An event received from one client, waiting to be relayed to the others.
#[derive(Debug)]
pub struct HubRequest {
    pub client_id: ClientId,
    pub msg: Message,
}

/// Channel from clients → hub task.
pub type HubTx = mpsc::UnboundedSender<HubRequest>;
pub type HubRx = mpsc::UnboundedReceiver<HubRequest>;
