//! event-streamer
//!
//! Bidirectional, line-delimited JSON events over any async duplex
//! transport.
//!
//! ```no_run
//! use event_streamer::{JsonEventStreamer, StreamerConfig};
//! use serde_json::json;
//!
//! # async fn demo(stream: tokio::net::TcpStream) -> Result<(), event_streamer::StreamError> {
//! let events = JsonEventStreamer::new(stream, StreamerConfig::default());
//!
//! events.on("example", |args| println!("example: {args:?}"));
//! events.on_all(|event, args| println!("{event:?}: {args:?}"));
//! events.on_error(|err| eprintln!("bad line: {err}"));
//!
//! // Writes {"event":"greet","arguments":["hello"]}\n
//! events.emit("greet", vec![json!("hello")])?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod types;
pub mod streamer;

// these are internal modules, not re-exported
mod reader;
mod writer;

pub use config::{ConfigError, StreamerConfig};
pub use streamer::JsonEventStreamer;

pub use event_core::{ListenerId, Message, StreamError, Value};
