//! event-relay
//!
//! Multi-client TCP relay: every event one client sends is re-emitted to
//! all other connected clients over the same line-delimited JSON protocol.

pub mod config;
pub mod types;
pub mod server;

// these are internal modules, not re-exported
mod client;
mod hub;
