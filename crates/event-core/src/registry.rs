//! Listener registry and dispatch.
//!
//! This is the explicit dispatch table behind the event streamer:
//! - Named listeners: event name -> ordered list of callbacks.
//! - Observe-all listeners: invoked for every dispatched message.
//! - Error listeners: the `"error"` channel.
//!
//! [`ListenerRegistry`] is the plain table. [`Dispatcher`] wraps it in an
//! `Arc<Mutex<_>>` so the handle and the reader task can share it, and
//! runs callbacks on a snapshot taken under the lock. Callbacks therefore
//! execute with the lock released and may call back into the dispatcher
//! (subscribe, unsubscribe, emit) without deadlocking.
//!
//! Removal semantics follow from the snapshot: a listener removed while a
//! dispatch is in progress may still be called by that dispatch, but never
//! by one that starts after the removal returned.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{trace, warn};

use crate::error::StreamError;
use crate::listener::{AllListener, ErrorListener, EventListener, ListenerId};
use crate::message::Message;

/// Named listener entry.
struct NamedEntry {
    id: ListenerId,
    callback: EventListener,
    /// Removed right before its first invocation.
    once: bool,
}

/// Listener table.
///
/// Named listeners are kept in an [`IndexMap`] so that
/// [`ListenerRegistry::event_names`] reports names in first-registration
/// order.
#[derive(Default)]
pub struct ListenerRegistry {
    /// Event name -> listeners, in registration order.
    named: IndexMap<String, Vec<NamedEntry>>,

    /// Observe-all listeners, in registration order.
    all: Vec<(ListenerId, AllListener)>,

    /// Error channel listeners, in registration order.
    error: Vec<(ListenerId, ErrorListener)>,
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("named", &self.named.keys().collect::<Vec<_>>())
            .field("all", &self.all.len())
            .field("error", &self.error.len())
            .finish()
    }
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        ListenerRegistry::default()
    }

    /// Register a listener for one event name.
    pub fn on(&mut self, event: &str, callback: EventListener) -> ListenerId {
        self.insert_named(event, callback, false)
    }

    /// Register a listener that fires at most once for `event`.
    pub fn once(&mut self, event: &str, callback: EventListener) -> ListenerId {
        self.insert_named(event, callback, true)
    }

    /// Register an observe-all listener.
    pub fn on_all(&mut self, callback: AllListener) -> ListenerId {
        let id = ListenerId::next();
        self.all.push((id, callback));
        id
    }

    /// Register an error channel listener.
    pub fn on_error(&mut self, callback: ErrorListener) -> ListenerId {
        let id = ListenerId::next();
        self.error.push((id, callback));
        id
    }

    /// Remove an observe-all listener. Unknown handles are a no-op.
    pub fn remove_all_listener(&mut self, id: ListenerId) -> bool {
        let before = self.all.len();
        self.all.retain(|(entry_id, _)| *entry_id != id);
        self.all.len() != before
    }

    /// Remove any listener (named, observe-all or error) by handle.
    ///
    /// Returns `false` if the handle was not registered.
    pub fn off(&mut self, id: ListenerId) -> bool {
        if self.remove_named(id) || self.remove_all_listener(id) {
            return true;
        }

        let before = self.error.len();
        self.error.retain(|(entry_id, _)| *entry_id != id);
        self.error.len() != before
    }

    /// Remove every named listener for `event`, or for all events when
    /// `event` is `None`. Observe-all and error listeners are untouched.
    pub fn remove_all_listeners(&mut self, event: Option<&str>) {
        match event {
            Some(name) => {
                self.named.shift_remove(name);
            }
            None => self.named.clear(),
        }
    }

    /// Number of named listeners currently registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.named.get(event).map_or(0, Vec::len)
    }

    /// Number of observe-all listeners.
    pub fn all_listener_count(&self) -> usize {
        self.all.len()
    }

    /// Number of error channel listeners.
    pub fn error_listener_count(&self) -> usize {
        self.error.len()
    }

    /// Event names with at least one named listener.
    pub fn event_names(&self) -> Vec<String> {
        self.named.keys().cloned().collect()
    }

    // -------------------------------------------------------------------------
    // Snapshots (used by `Dispatcher`)
    // -------------------------------------------------------------------------

    /// Callbacks to run for `event`. `once` entries are removed here, so
    /// they can never fire twice even under concurrent dispatch.
    fn take_named(&mut self, event: &str) -> Vec<EventListener> {
        let Some(entries) = self.named.get_mut(event) else {
            return Vec::new();
        };

        let snapshot = entries.iter().map(|e| Arc::clone(&e.callback)).collect();
        entries.retain(|e| !e.once);
        if entries.is_empty() {
            self.named.shift_remove(event);
        }

        snapshot
    }

    fn snapshot_all(&self) -> Vec<AllListener> {
        self.all.iter().map(|(_, cb)| Arc::clone(cb)).collect()
    }

    fn snapshot_error(&self) -> Vec<ErrorListener> {
        self.error.iter().map(|(_, cb)| Arc::clone(cb)).collect()
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn insert_named(&mut self, event: &str, callback: EventListener, once: bool) -> ListenerId {
        let id = ListenerId::next();
        self.named
            .entry(event.to_string())
            .or_default()
            .push(NamedEntry { id, callback, once });
        id
    }

    fn remove_named(&mut self, id: ListenerId) -> bool {
        let mut emptied = None;
        let mut removed = false;

        for (name, entries) in self.named.iter_mut() {
            if let Some(pos) = entries.iter().position(|e| e.id == id) {
                entries.remove(pos);
                removed = true;
                if entries.is_empty() {
                    emptied = Some(name.clone());
                }
                break;
            }
        }

        if let Some(name) = emptied {
            self.named.shift_remove(&name);
        }

        removed
    }
}

/// Shared, cloneable handle to a [`ListenerRegistry`] that performs
/// dispatch.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    registry: Arc<Mutex<ListenerRegistry>>,
}

impl Dispatcher {
    /// Create a dispatcher with an empty registry.
    pub fn new() -> Self {
        Dispatcher::default()
    }

    /// Run `f` with the registry locked.
    ///
    /// Do not dispatch from inside `f`; the lock is not reentrant.
    pub fn with_registry<R>(&self, f: impl FnOnce(&mut ListenerRegistry) -> R) -> R {
        f(&mut self.lock())
    }

    /// Dispatch a message to observe-all listeners, then to named listeners.
    ///
    /// Both paths see the same `Message`. A message without a usable event
    /// name only reaches observe-all listeners.
    pub fn dispatch(&self, message: &Message) {
        self.dispatch_all(message);
        self.dispatch_named(message);
    }

    /// Dispatch to observe-all listeners only, in registration order.
    pub fn dispatch_all(&self, message: &Message) {
        let listeners = self.lock().snapshot_all();
        trace!(
            event = ?message.event,
            listeners = listeners.len(),
            "dispatching to observe-all listeners"
        );

        for listener in listeners {
            listener(message.event_name(), &message.arguments);
        }
    }

    /// Dispatch to listeners registered for the message's event name.
    pub fn dispatch_named(&self, message: &Message) {
        let Some(event) = message.event_name().filter(|name| !name.is_empty()) else {
            trace!("message has no event name, skipping named dispatch");
            return;
        };

        self.emit_named(event, &message.arguments);
    }

    /// Invoke the named listeners of `event` with `arguments`.
    ///
    /// Returns `true` if at least one listener was invoked.
    pub fn emit_named(&self, event: &str, arguments: &[Value]) -> bool {
        let listeners = self.lock().take_named(event);
        trace!(event = %event, listeners = listeners.len(), "dispatching named event");

        for listener in &listeners {
            listener(arguments);
        }

        !listeners.is_empty()
    }

    /// Deliver an error on the `"error"` channel.
    ///
    /// With no error listeners registered, the error is logged instead.
    pub fn dispatch_error(&self, error: &StreamError) {
        let listeners = self.lock().snapshot_error();

        if listeners.is_empty() {
            warn!(%error, "unhandled event stream error");
            return;
        }

        for listener in listeners {
            listener(error);
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListenerRegistry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
