//! Central relay loop.
//!
//! Every client's observe-all listener forwards what it receives here.
//! The hub re-emits each message to every other connected client. The
//! sender never gets its own message back.

use std::collections::HashMap;

use event_core::Message;
use tracing::{debug, info, trace, warn};

use crate::types::{ClientHandle, ClientId, ClientRegistry, HubRequest, HubRx};

/// Run the hub until every `HubTx` has been dropped.
pub async fn run_hub_loop(mut hub_rx: HubRx, clients: ClientRegistry) {
    while let Some(req) = hub_rx.recv().await {
        let HubRequest { client_id, msg } = req;

        if !msg.has_event_name() {
            debug!(client = %client_id, "not relaying message without an event name");
            continue;
        }

        // Snapshot of current clients to minimize lock hold time.
        let current_clients = {
            let guard = clients.read().await;
            guard.clone()
        };

        let delivered = route_message(client_id, &msg, &current_clients);
        trace!(client = %client_id, event = ?msg.event, delivered, "relayed message");
    }

    info!("hub loop shutting down (hub_rx closed)");
}

/// Emit `msg` on every client except `origin`. Returns how many got it.
fn route_message(
    origin: ClientId,
    msg: &Message,
    clients: &HashMap<ClientId, ClientHandle>,
) -> usize {
    let mut delivered = 0;

    for (cid, events) in clients.iter() {
        if *cid == origin {
            continue;
        }

        match events.emit_message(msg) {
            Ok(()) => delivered += 1,
            Err(e) => warn!(client = %cid, error = %e, "failed to relay message"),
        }
    }

    delivered
}
