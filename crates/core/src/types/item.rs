//! Wishlist item snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::PriceRange;

/// Product or collection image snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    /// Image URL.
    pub url: String,
    /// Alt text for accessibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
}

/// One product a visitor wants to remember.
///
/// Display fields (`title`, `handle`, `image`, `price_range`) are an
/// immutable snapshot taken at add-time; they are not re-fetched live.
/// Stale snapshots are acceptable - the product page is the source of
/// truth once the visitor clicks through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItem {
    /// Opaque stable product identifier; unique key within a wishlist.
    pub id: ProductId,
    /// Product title at add-time.
    pub title: String,
    /// URL handle for navigation.
    pub handle: String,
    /// Image snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<Image>,
    /// Price range snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_range: Option<PriceRange>,
    /// Timestamp set at insertion; used for ordering and migration
    /// tie-breaking.
    pub added_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::money::Money;

    fn sample_item() -> WishlistItem {
        WishlistItem {
            id: ProductId::new("gid://shopify/Product/1"),
            title: "Linen Shirt".to_string(),
            handle: "linen-shirt".to_string(),
            image: Some(Image {
                url: "https://cdn.example.com/shirt.jpg".to_string(),
                alt_text: Some("A linen shirt".to_string()),
            }),
            price_range: Some(PriceRange {
                min_variant_price: Money {
                    amount: "49.00".to_string(),
                    currency_code: "USD".to_string(),
                },
            }),
            added_at: "2026-01-15T10:00:00Z".parse().expect("timestamp"),
        }
    }

    #[test]
    fn test_item_wire_shape_is_camel_case() {
        let json = serde_json::to_value(sample_item()).expect("serialize");

        assert_eq!(json["id"], "gid://shopify/Product/1");
        assert_eq!(json["image"]["altText"], "A linen shirt");
        assert_eq!(json["priceRange"]["minVariantPrice"]["amount"], "49.00");
        assert!(json.get("addedAt").is_some());
        assert!(json.get("added_at").is_none());
    }

    #[test]
    fn test_optional_fields_omitted_when_absent() {
        let mut item = sample_item();
        item.image = None;
        item.price_range = None;

        let json = serde_json::to_value(&item).expect("serialize");
        assert!(json.get("image").is_none());
        assert!(json.get("priceRange").is_none());
    }

    #[test]
    fn test_item_round_trips() {
        let item = sample_item();
        let json = serde_json::to_string(&item).expect("serialize");
        let back: WishlistItem = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, item);
    }
}
