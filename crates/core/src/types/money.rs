//! Monetary snapshot types.
//!
//! These mirror the storefront API's money shapes. Amounts stay as strings
//! to preserve decimal precision; the wishlist never does arithmetic on
//! them, it only displays and round-trips them.

use serde::{Deserialize, Serialize};

/// Monetary amount with currency code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Money {
    /// Decimal amount as string (preserves precision).
    pub amount: String,
    /// ISO 4217 currency code.
    pub currency_code: String,
}

/// Price range snapshot captured when an item is added.
///
/// Only the minimum variant price is carried; the wishlist shows a
/// "from" price, not the full variant spread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRange {
    /// Minimum price among all variants.
    pub min_variant_price: Money,
}
