//! Core types for the wishlist data model.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod item;
pub mod money;
pub mod wishlist;

pub use id::ProductId;
pub use item::{Image, WishlistItem};
pub use money::{Money, PriceRange};
pub use wishlist::Wishlist;
