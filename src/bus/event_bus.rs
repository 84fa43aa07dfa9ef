use std::any::Any;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::event_types::{Event, EventKind};
use crate::core::run_isolated;

type ErasedHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

/// Token returned by [`EventBus::on`]; hand it back to [`EventBus::off`] to
/// remove exactly the handler it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[must_use = "dropping a Subscription leaves the handler registered with no way to remove it"]
pub struct Subscription {
    kind: EventKind,
    id: u64,
}

impl Subscription {
    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

/// Synchronous publish/subscribe channel for cross-cutting notifications.
///
/// Handlers for a kind run in registration order on the emitting thread. A
/// handler that panics is logged and skipped; the remaining handlers still run.
pub struct EventBus {
    handlers: Mutex<HashMap<EventKind, Vec<(u64, ErasedHandler)>>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `handler` for every future `E` emitted on this bus.
    pub fn on<E, F>(&self, handler: F) -> Subscription
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let erased: ErasedHandler = Arc::new(move |payload: &dyn Any| {
            if let Some(payload) = payload.downcast_ref::<E>() {
                handler(payload);
            }
        });

        self.lock()
            .entry(E::KIND)
            .or_default()
            .push((id, erased));

        Subscription { kind: E::KIND, id }
    }

    /// Remove the handler behind `subscription`. Returns `false` if it was
    /// already gone (removed earlier, or wiped by [`clear`](Self::clear)).
    pub fn off(&self, subscription: Subscription) -> bool {
        let mut handlers = self.lock();
        let Some(list) = handlers.get_mut(&subscription.kind) else {
            return false;
        };

        let before = list.len();
        list.retain(|(id, _)| *id != subscription.id);
        let removed = list.len() != before;

        if list.is_empty() {
            handlers.remove(&subscription.kind);
        }
        removed
    }

    /// Invoke every handler registered for `E::KIND`, in registration order.
    pub fn emit<E: Event>(&self, payload: E) {
        // Snapshot so handlers may call on/off/emit without deadlocking.
        let snapshot: Vec<ErasedHandler> = match self.lock().get(&E::KIND) {
            Some(list) => list.iter().map(|(_, handler)| handler.clone()).collect(),
            None => return,
        };

        tracing::debug!(event = E::KIND.as_str(), handlers = snapshot.len(), "emit");

        let context = format!("{} handler", E::KIND);
        for handler in snapshot {
            run_isolated(&context, || handler(&payload));
        }
    }

    /// Remove every handler for every kind.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.lock().get(&kind).map_or(0, Vec::len)
    }

    /// Number of kinds that currently have at least one handler.
    pub fn registered_kinds(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<EventKind, Vec<(u64, ErasedHandler)>>> {
        self.handlers.lock().expect("event bus mutex poisoned")
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Process-wide instance
// ---------------------------------------------------------------------------

static GLOBAL_BUS: Mutex<Option<Arc<EventBus>>> = Mutex::new(None);

/// Shared bus for collaborators that are not wired explicitly.
pub fn get_event_bus() -> Arc<EventBus> {
    let mut slot = GLOBAL_BUS.lock().expect("global bus mutex poisoned");
    slot.get_or_insert_with(|| Arc::new(EventBus::new())).clone()
}

/// Clear and drop the shared bus; the next [`get_event_bus`] builds a new one.
pub fn reset_event_bus() {
    let previous = GLOBAL_BUS.lock().expect("global bus mutex poisoned").take();
    if let Some(bus) = previous {
        bus.clear();
    }
}
