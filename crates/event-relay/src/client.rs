// crates/event-relay/src/client.rs

use tokio::net::TcpStream;
use tracing::{debug, warn};

use event_core::Message;
use event_streamer::{JsonEventStreamer, StreamerConfig};

use crate::types::{ClientHandle, ClientId, ClientRegistry, HubRequest, HubTx};

/// Wrap an accepted connection in a streamer wired to the hub.
///
/// Every message the client sends is forwarded to the hub as a
/// `HubRequest`. Undecodable lines are logged and otherwise ignored.
pub fn connect_client(
    client_id: ClientId,
    stream: TcpStream,
    hub_tx: HubTx,
    config: StreamerConfig,
) -> ClientHandle {
    let (read_stream, write_stream) = stream.into_split();

    let events = JsonEventStreamer::from_split_with(read_stream, write_stream, config, |events| {
        events.on_all(move |event, arguments| {
            let req = HubRequest {
                client_id,
                msg: Message {
                    event: event.map(str::to_string),
                    arguments: arguments.to_vec(),
                },
            };

            if hub_tx.send(req).is_err() {
                debug!(client = %client_id, "hub channel closed, dropping message");
            }
        });

        events.on_error(move |err| {
            warn!(client = %client_id, error = %err, "bad line from client");
        });
    });

    ClientHandle::new(events)
}

/// Wait for the client's input to end, then remove it from the registry.
pub async fn run_client(client_id: ClientId, events: ClientHandle, clients: ClientRegistry) {
    events.finished().await;

    let mut guard = clients.write().await;
    guard.remove(&client_id);
    debug!(client = %client_id, remaining = guard.len(), "client disconnected");
}
