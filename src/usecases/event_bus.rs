//! Event Bus - Per-Event Subscriber Fan-out
//!
//! Keeps an ordered handler list per `EventKind`. Dispatch runs over a
//! snapshot of the list taken when `emit` is called, in registration
//! order. A panicking handler is caught and logged; the remaining
//! handlers still run and `emit` itself never panics.

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::error;

use crate::domain::events::{EventKind, FeedEvent};

/// Subscriber callback. Identity (for `off`) is the `Arc` pointer.
pub type Handler = Arc<dyn Fn(&FeedEvent) + Send + Sync>;

/// Wrap a closure as a `Handler`.
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&FeedEvent) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Subscriber registry with isolated dispatch.
#[derive(Default)]
pub struct EventBus {
    handlers: RwLock<HashMap<EventKind, Vec<Handler>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the list for `kind`.
    pub fn on(&self, kind: EventKind, handler: Handler) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push(handler);
    }

    /// Remove the first registration of `handler` for `kind`.
    ///
    /// Returns `false` if it was not registered.
    pub fn off(&self, kind: EventKind, handler: &Handler) -> bool {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };
        match list.iter().position(|h| Arc::ptr_eq(h, handler)) {
            Some(index) => {
                list.remove(index);
                true
            }
            None => false,
        }
    }

    /// Deliver `event` to every handler registered for its kind.
    pub fn emit(&self, event: &FeedEvent) {
        let kind = event.kind();
        let snapshot: Vec<Handler> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .unwrap_or_default();

        for (index, handler) in snapshot.iter().enumerate() {
            if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(|| handler(event))) {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(?kind, index, %reason, "Event handler panicked");
            }
        }
    }

    /// Number of handlers registered for `kind`.
    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
        let counts: HashMap<_, _> = handlers.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("EventBus").field("handlers", &counts).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, Handler) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        (count, handler(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        }))
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        for i in 0..3 {
            let order = Arc::clone(&order);
            bus.on(EventKind::Reconnect, handler(move |_| order.lock().unwrap().push(i)));
        }
        bus.emit(&FeedEvent::Reconnect { attempt: 1 });
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_only_matching_kind_receives() {
        let bus = EventBus::new();
        let (count, h) = counter();
        bus.on(EventKind::Error, h);
        bus.emit(&FeedEvent::Reconnect { attempt: 1 });
        assert_eq!(count.load(Ordering::SeqCst), 0);
        bus.emit(&FeedEvent::error("boom", None));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panicking_handler_is_isolated() {
        let bus = EventBus::new();
        let (count, h) = counter();
        bus.on(EventKind::Reconnect, handler(|_| panic!("subscriber bug")));
        bus.on(EventKind::Reconnect, h);
        bus.emit(&FeedEvent::Reconnect { attempt: 2 });
        bus.emit(&FeedEvent::Reconnect { attempt: 3 });
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_off_removes_by_identity() {
        let bus = EventBus::new();
        let (count, h) = counter();
        let (_, other) = counter();
        bus.on(EventKind::Status, Arc::clone(&h));
        assert!(!bus.off(EventKind::Status, &other));
        assert!(!bus.off(EventKind::Error, &h));
        assert!(bus.off(EventKind::Status, &h));
        assert!(!bus.off(EventKind::Status, &h));
        bus.emit(&FeedEvent::Status {
            status: crate::domain::events::ConnectionState::Connected,
        });
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_off_removes_only_first_registration() {
        let bus = EventBus::new();
        let (count, h) = counter();
        bus.on(EventKind::Reconnect, Arc::clone(&h));
        bus.on(EventKind::Reconnect, Arc::clone(&h));
        bus.off(EventKind::Reconnect, &h);
        assert_eq!(bus.handler_count(EventKind::Reconnect), 1);
        bus.emit(&FeedEvent::Reconnect { attempt: 1 });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_added_during_dispatch_waits_for_next_emit() {
        let bus = Arc::new(EventBus::new());
        let (count, late) = counter();
        let bus_ref = Arc::clone(&bus);
        bus.on(EventKind::Reconnect, handler(move |_| {
            bus_ref.on(EventKind::Reconnect, Arc::clone(&late));
        }));
        bus.emit(&FeedEvent::Reconnect { attempt: 1 });
        assert_eq!(count.load(Ordering::SeqCst), 0);
        bus.emit(&FeedEvent::Reconnect { attempt: 2 });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
