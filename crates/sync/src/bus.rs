//! Cross-component notification bus.
//!
//! Decouples "something changed the wishlist" from "something needs to
//! re-render". An explicit, injectable pub/sub interface replaces ambient
//! globals: any number of UI surfaces (buttons, badges, the list page)
//! subscribe and learn the current count without polling, and the core
//! stays unit-testable with no hidden state.

use std::sync::{Arc, Mutex, Weak};

use wishlist_core::ProductId;

/// Event delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum WishlistEvent {
    /// The in-memory wishlist changed; carries the new count and, when a
    /// single toggle caused it, the affected product id.
    CountChanged {
        count: usize,
        changed: Option<ProductId>,
    },

    /// The session storage slot was written by some tab of the same
    /// anonymous session. Subscribers recompute their own count by
    /// re-reading the session cache; the signal carries no payload so
    /// stale cross-tab data is never accepted as authoritative.
    StorageChanged,
}

type Handler = Arc<dyn Fn(&WishlistEvent) + Send + Sync>;

#[derive(Default)]
struct BusInner {
    next_id: u64,
    handlers: Vec<(u64, Handler)>,
}

/// In-process publish/subscribe bus.
///
/// Cheaply cloneable; clones share the same subscriber registry. Handlers
/// run synchronously on the publishing thread, outside the registry lock,
/// so a handler may publish or subscribe without deadlocking.
#[derive(Clone, Default)]
pub struct NotificationBus {
    inner: Arc<Mutex<BusInner>>,
}

impl NotificationBus {
    /// Create a new bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. Dropping the returned [`Subscription`]
    /// unsubscribes it.
    #[must_use = "dropping the subscription immediately unsubscribes the handler"]
    pub fn subscribe(&self, handler: impl Fn(&WishlistEvent) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            let id = inner.next_id;
            inner.next_id += 1;
            inner.handlers.push((id, Arc::new(handler)));
            id
        };

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to all current subscribers.
    pub fn publish(&self, event: &WishlistEvent) {
        // Snapshot the handlers so delivery happens outside the lock.
        let handlers: Vec<Handler> = {
            let inner = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            inner.handlers.iter().map(|(_, h)| Arc::clone(h)).collect()
        };

        for handler in handlers {
            handler(event);
        }
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .handlers
            .len()
    }
}

/// Handle for an active subscription; dropping it unsubscribes.
pub struct Subscription {
    id: u64,
    bus: Weak<Mutex<BusInner>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            let mut inner = bus.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            inner.handlers.retain(|(id, _)| *id != self.id);
        }
    }
}
