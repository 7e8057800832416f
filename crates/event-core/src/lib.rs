//! event-core
//!
//! Pure event dispatch logic:
//! - message type (event name + JSON arguments)
//! - listener handles and callback types
//! - listener registry and dispatcher
//! - error types

pub mod message;
pub mod listener;
pub mod registry;
pub mod error;

pub use message::Message;

pub use listener::{
    AllListener,
    ErrorListener,
    EventListener,
    ListenerId,
};

pub use registry::{Dispatcher, ListenerRegistry};
pub use error::StreamError;

/// Re-exported so downstream crates and listeners share one `Value` type.
pub use serde_json::Value;
