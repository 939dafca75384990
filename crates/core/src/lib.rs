//! Wishlist Core - Shared types library.
//!
//! This crate provides the passive data model used across the wishlist
//! components:
//!
//! - `sync` - The synchronization core (stores, backends, controller)
//! - `integration-tests` - End-to-end scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage
//! access. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Product identifiers, price/image snapshots, wishlist items,
//!   and the ordered [`types::Wishlist`] collection

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
