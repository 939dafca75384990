//! The ordered wishlist collection.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::item::WishlistItem;

/// Ordered, id-unique collection of wishlist items for one visitor.
///
/// This is the passive snapshot form: it is what gets serialized to the
/// session slot or returned by the server client. Mutation happens only
/// through the sync layer's item store, which produces new snapshots.
///
/// Serializes as a plain JSON array of items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Wishlist {
    items: Vec<WishlistItem>,
}

impl Wishlist {
    /// Create an empty wishlist.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a wishlist from items, preserving order.
    ///
    /// Duplicate ids are dropped, keeping the first occurrence.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = WishlistItem>) -> Self {
        let mut deduped: Vec<WishlistItem> = Vec::new();
        for item in items {
            if !deduped.iter().any(|existing| existing.id == item.id) {
                deduped.push(item);
            }
        }
        Self { items: deduped }
    }

    /// Whether an item with this id is present.
    #[must_use]
    pub fn contains(&self, id: &ProductId) -> bool {
        self.items.iter().any(|item| &item.id == id)
    }

    /// Get an item by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&WishlistItem> {
        self.items.iter().find(|item| &item.id == id)
    }

    /// Iterate items in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &WishlistItem> {
        self.items.iter()
    }

    /// Item ids in insertion order.
    #[must_use]
    pub fn ids(&self) -> Vec<ProductId> {
        self.items.iter().map(|item| item.id.clone()).collect()
    }

    /// Number of items.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len()
    }

    /// Whether the wishlist has no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Consume the wishlist, returning its items in order.
    #[must_use]
    pub fn into_items(self) -> Vec<WishlistItem> {
        self.items
    }
}

impl IntoIterator for Wishlist {
    type Item = WishlistItem;
    type IntoIter = std::vec::IntoIter<WishlistItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Wishlist {
    type Item = &'a WishlistItem;
    type IntoIter = std::slice::Iter<'a, WishlistItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
