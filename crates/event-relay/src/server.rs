//! TCP listener and top-level server wiring.
//!
//! This module:
//! - Listens on the configured address/port.
//! - Accepts new TCP connections.
//! - Assigns each connection a `ClientId`.
//! - Spawns:
//!   - a per-client task that waits for the connection to end,
//!   - a single hub task that relays events between clients.
//!
//! Per-client wiring and the hub loop live in the `client` and `hub`
//! modules respectively.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::client;
use crate::config::Config;
use crate::hub;
use crate::types::{ClientId, ClientRegistry, HubRx, HubTx};

static NEXT_CLIENT_ID: AtomicU64 = AtomicU64::new(1);

fn next_client_id() -> ClientId {
    let id = NEXT_CLIENT_ID.fetch_add(1, Ordering::Relaxed);
    ClientId(id)
}

/// Bind the configured address and run the relay.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let addr = config.socket_addr_string();
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    serve(listener, config).await
}

/// Run the relay on an already bound listener.
///
/// Only returns if accepting a connection fails.
pub async fn serve(listener: TcpListener, config: Config) -> anyhow::Result<()> {
    let mut streamer_config = config.streamer.clone();
    if streamer_config.emit_local_events {
        warn!("emit_local_events would loop relayed events back into the hub; disabling it");
        streamer_config.emit_local_events = false;
    }

    // Shared registry of connected clients.
    let clients: ClientRegistry = Arc::new(RwLock::new(Default::default()));

    // Channel from clients → hub task.
    let (hub_tx, hub_rx): (HubTx, HubRx) = mpsc::unbounded_channel();

    {
        let clients_clone = clients.clone();
        tokio::spawn(async move {
            hub::run_hub_loop(hub_rx, clients_clone).await;
        });
    }

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let current_clients = {
            let guard = clients.read().await;
            guard.len()
        };

        if current_clients >= config.max_clients {
            warn!(
                peer = %peer_addr,
                max_clients = config.max_clients,
                "rejecting connection: max_clients reached"
            );
            // Dropping the stream closes the connection.
            continue;
        }

        let client_id = next_client_id();
        debug!(client = %client_id, peer = %peer_addr, "accepted connection");

        let events = client::connect_client(client_id, stream, hub_tx.clone(), streamer_config.clone());

        {
            let mut guard = clients.write().await;
            guard.insert(client_id, events.clone());
        }

        tokio::spawn(client::run_client(client_id, events, clients.clone()));
    }
}
