//! Listener handles and callback types.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::error::StreamError;

/// Handle returned by every listener registration.
///
/// Closures have no identity of their own, so removal goes through this
/// handle. Handles are unique over the lifetime of the process, which
/// means registering the same closure twice yields two independent
/// entries, and removing one handle removes exactly one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

impl ListenerId {
    pub(crate) fn next() -> Self {
        ListenerId(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, mostly useful for logging.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Callback for a single named event: receives the positional arguments.
pub type EventListener = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Callback for every dispatched message: receives `(event, arguments)`.
pub type AllListener = Arc<dyn Fn(Option<&str>, &[Value]) + Send + Sync>;

/// Callback for the `"error"` channel.
pub type ErrorListener = Arc<dyn Fn(&StreamError) + Send + Sync>;
