//! Session-scoped persistence for anonymous visitors.
//!
//! The anonymous wishlist is durable only for the browser session. The
//! actual key-value slot is injected via [`StorageSlot`] so the cache can
//! run against session storage in a browser host, a cookie-backed slot in
//! a server-rendered host, or plain memory in tests - the core never
//! touches a global.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use wishlist_core::Wishlist;

use crate::bus::{NotificationBus, WishlistEvent};

/// Storage key used inside the slot's namespace.
pub const STORAGE_KEY: &str = "wishlist_session_items";

/// Errors a storage slot can report.
///
/// These never propagate past the session cache: reads degrade to an empty
/// wishlist, writes are best-effort.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The storage quota was exceeded.
    #[error("Storage quota exceeded")]
    QuotaExceeded,

    /// Storage is disabled or unavailable in this context.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// A single session-scoped key-value slot.
///
/// One key, string value, synchronous. Implementations decide where the
/// bytes live; the cache owns the serialization.
pub trait StorageSlot: Send + Sync {
    /// Read the stored value, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be read at all.
    fn get(&self) -> Result<Option<String>, StorageError>;

    /// Overwrite the stored value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on quota or availability failures.
    fn set(&self, value: &str) -> Result<(), StorageError>;

    /// Remove the stored value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the slot cannot be written.
    fn remove(&self) -> Result<(), StorageError>;
}

/// In-memory slot for tests and in-process sessions.
#[derive(Clone, Default)]
pub struct MemorySlot {
    value: Arc<Mutex<Option<String>>>,
}

impl MemorySlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot pre-populated with a raw value.
    ///
    /// Useful for corrupt-data tests.
    #[must_use]
    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(value.into()))),
        }
    }
}

impl StorageSlot for MemorySlot {
    fn get(&self) -> Result<Option<String>, StorageError> {
        Ok(self
            .value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn set(&self, value: &str) -> Result<(), StorageError> {
        *self
            .value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(value.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), StorageError> {
        *self
            .value
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Durable-for-the-session storage of a wishlist snapshot.
///
/// Used only for anonymous visitors. The stored value is a JSON array of
/// items; absence of the key and malformed JSON are both treated as an
/// empty wishlist.
#[derive(Clone)]
pub struct SessionCache {
    slot: Arc<dyn StorageSlot>,
    signal: Option<NotificationBus>,
}

impl SessionCache {
    /// Create a cache over the given slot.
    pub fn new(slot: impl StorageSlot + 'static) -> Self {
        Self {
            slot: Arc::new(slot),
            signal: None,
        }
    }

    /// Attach a bus that receives [`WishlistEvent::StorageChanged`] after
    /// each successful write, so other tabs of the same session can
    /// recompute their count by re-reading the cache.
    #[must_use]
    pub fn with_signal(mut self, bus: NotificationBus) -> Self {
        self.signal = Some(bus);
        self
    }

    /// Read the stored wishlist.
    ///
    /// Missing key yields an empty wishlist. Malformed data also yields an
    /// empty wishlist and the corrupt value is discarded - fail-safe, not
    /// fail-loud.
    #[must_use]
    pub fn load(&self) -> Wishlist {
        let raw = match self.slot.get() {
            Ok(Some(raw)) => raw,
            Ok(None) => return Wishlist::empty(),
            Err(e) => {
                tracing::warn!("Session storage read failed: {e}");
                return Wishlist::empty();
            }
        };

        match serde_json::from_str::<Wishlist>(&raw) {
            Ok(wishlist) => wishlist,
            Err(e) => {
                tracing::warn!("Discarding corrupt session wishlist: {e}");
                match self.slot.remove() {
                    // The slot contents changed; sibling tabs holding a
                    // count derived from the old value must re-read.
                    Ok(()) => self.emit_storage_changed(),
                    Err(e) => tracing::warn!("Failed to discard corrupt value: {e}"),
                }
                Wishlist::empty()
            }
        }
    }

    /// Serialize and overwrite the stored value.
    ///
    /// Best-effort: a write failure (quota exceeded, storage disabled) is
    /// swallowed and logged, never returned. The anonymous wishlist then
    /// degrades to in-memory-only for the session.
    pub fn save(&self, snapshot: &Wishlist) {
        let json = match serde_json::to_string(snapshot) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize wishlist snapshot: {e}");
                return;
            }
        };

        match self.slot.set(&json) {
            Ok(()) => self.emit_storage_changed(),
            Err(e) => tracing::warn!("Session storage write failed: {e}"),
        }
    }

    /// Remove the stored value.
    pub fn clear(&self) {
        match self.slot.remove() {
            Ok(()) => self.emit_storage_changed(),
            Err(e) => tracing::warn!("Session storage clear failed: {e}"),
        }
    }

    fn emit_storage_changed(&self) {
        if let Some(bus) = &self.signal {
            bus.publish(&WishlistEvent::StorageChanged);
        }
    }
}
