//! In-memory representation of the current wishlist.
//!
//! The item store is the single piece of mutable shared state in the
//! subsystem. It is owned by the sync controller, which is the only
//! component permitted to mutate it; everything else reads snapshots.
//! No I/O, deterministic.

use chrono::{DateTime, Utc};

use wishlist_core::{ProductId, Wishlist, WishlistItem};

/// Ordered, id-unique collection of wishlist items.
///
/// Invariants:
/// - Item ids are unique; adding an existing id is a no-op.
/// - Insertion order is preserved for display.
/// - `added_at` is monotonic per store: an insert carrying an earlier
///   timestamp is clamped up to the store's high-water mark.
#[derive(Debug, Clone, Default)]
pub struct ItemStore {
    items: Vec<WishlistItem>,
    high_water: Option<DateTime<Utc>>,
}

impl ItemStore {
    /// Create an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            items: Vec::new(),
            high_water: None,
        }
    }

    /// Create a store from an authoritative snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: Wishlist) -> Self {
        let items = snapshot.into_items();
        let high_water = items.iter().map(|item| item.added_at).max();
        Self { items, high_water }
    }

    /// Whether an item with this id is present.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    /// Insert an item if its id is absent.
    ///
    /// Returns whether a change occurred. A duplicate id is a no-op, which
    /// makes add idempotent.
    pub fn add(&mut self, mut item: WishlistItem) -> bool {
        if self.contains(&item.id) {
            return false;
        }

        // Clamp to keep added_at monotonic within this store.
        if let Some(high) = self.high_water
            && item.added_at < high
        {
            item.added_at = high;
        }
        self.high_water = Some(item.added_at);

        self.items.push(item);
        true
    }

    /// Delete an item if present. Returns whether a change occurred.
    pub fn remove(&mut self, id: &ProductId) -> bool {
        self.take(id).is_some()
    }

    /// Remove an item, returning its position and value for later restore.
    ///
    /// Used by the controller to roll a single id back without touching
    /// concurrent optimistic state for other ids.
    pub(crate) fn take(&mut self, id: &ProductId) -> Option<(usize, WishlistItem)> {
        let index = self.items.iter().position(|item| &item.id == id)?;
        Some((index, self.items.remove(index)))
    }

    /// Re-insert a previously taken item at its original position.
    ///
    /// No-op if the id reappeared in the meantime. The restore bypasses the
    /// monotonic clamp: the item keeps the timestamp it was taken with.
    pub(crate) fn restore(&mut self, index: usize, item: WishlistItem) {
        if self.contains(&item.id) {
            return;
        }
        let index = index.min(self.items.len());
        self.items.insert(index, item);
    }

    /// Stable copy of the current state for persistence or rendering.
    #[must_use]
    pub fn snapshot(&self) -> Wishlist {
        Wishlist::from_items(self.items.iter().cloned())
    }

    /// Number of items.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Replace the contents with an authoritative snapshot.
    ///
    /// Used when the durable backend reports a different state than the
    /// optimistic guess (server-side dedup, validation).
    pub fn replace(&mut self, snapshot: Wishlist) {
        self.items = snapshot.into_items();
        let snapshot_high = self.items.iter().map(|item| item.added_at).max();
        self.high_water = self.high_water.max(snapshot_high);
    }

    /// Item ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> Vec<ProductId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }
}
