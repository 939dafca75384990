//! Newtype ID for type-safe product references.
//!
//! Product identifiers are opaque strings assigned by the commerce platform
//! (e.g. `gid://shopify/Product/123`). Wrapping them in a newtype prevents
//! accidentally mixing them with other string-typed values like handles.

use serde::{Deserialize, Serialize};

/// Opaque, stable product identifier.
///
/// Unique key within a wishlist. The value is never parsed or interpreted;
/// equality and hashing are the only operations the core performs on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    /// Create a new product ID from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}
