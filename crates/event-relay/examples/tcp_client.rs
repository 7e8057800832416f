//! Interactive relay client.
//!
//! Each stdin line is `<event> [json args...]`, e.g. `chat "hello" 42`.
//! Arguments that don't parse as JSON are sent as strings. Everything the
//! relay forwards is printed.

use std::env;

use event_streamer::{JsonEventStreamer, StreamerConfig, Value};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let addr = env::var("RELAY_CLIENT_ADDR").unwrap_or_else(|_| "127.0.0.1:9100".to_string());

    println!("Connecting to {}...", addr);
    let stream = TcpStream::connect(&addr).await?;
    println!("Connected. Type `<event> [args...]`, or 'quit' to leave.\n");

    let events = JsonEventStreamer::new_with(stream, StreamerConfig::from_env()?, |events| {
        events.on_all(|event, arguments| {
            println!("<< {} {:?}", event.unwrap_or("<unnamed>"), arguments);
        });
        events.on_error(|err| eprintln!("!! {err}"));
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = stdin.next_line() => {
                let Some(line) = line? else {
                    println!("\nEOF on stdin, exiting client.");
                    break;
                };

                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
                    println!("Exiting client.");
                    break;
                }

                let mut parts = trimmed.split_whitespace();
                let Some(event) = parts.next() else { continue };
                let arguments = parts
                    .map(|arg| serde_json::from_str(arg).unwrap_or_else(|_| Value::String(arg.to_string())))
                    .collect();

                events.emit(event, arguments)?;
            }
            _ = events.finished() => {
                println!("Relay closed the connection.");
                break;
            }
        }
    }

    events.close().await;
    Ok(())
}
