//! Wishlist synchronization core.
//!
//! A dual-mode client/server state cache for wishlist membership. The same
//! core behaves consistently whether a visitor is anonymous (session-scoped
//! storage only) or authenticated (durable server record), applies changes
//! optimistically for responsiveness, reconciles divergence when a visitor
//! logs in mid-session, and broadcasts state changes to any number of UI
//! surfaces without a central store.
//!
//! # Architecture
//!
//! - [`store::ItemStore`] - in-memory ordered, id-unique item collection
//! - [`session::SessionCache`] - session-scoped persistence for anonymous
//!   visitors, over an injected [`session::StorageSlot`]
//! - [`client::RemoteWishlist`] - contract for the authenticated visitor's
//!   durable server record, with [`client::HttpWishlistClient`] over JSON
//! - [`sync::SyncController`] - the optimistic-update/rollback state
//!   machine; sole mutator of the shared item store
//! - [`migrate::MigrationAdapter`] - one-shot merge of the anonymous
//!   session wishlist into the server record at login
//! - [`bus::NotificationBus`] - in-process pub/sub plus a cross-tab
//!   storage-change signal
//!
//! Exactly one backend is authoritative for a visitor at any time; the
//! choice is made once per session via [`sync::Backend`], never re-checked
//! at call sites.
//!
//! # Example
//!
//! ```rust,ignore
//! use wishlist_sync::bus::NotificationBus;
//! use wishlist_sync::session::{MemorySlot, SessionCache};
//! use wishlist_sync::sync::{Backend, SyncController};
//!
//! let bus = NotificationBus::new();
//! let cache = SessionCache::new(MemorySlot::new()).with_signal(bus.clone());
//! let controller = SyncController::anonymous(cache, bus);
//!
//! controller.load().await?;
//! controller.toggle(product_id, Some(&details)).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod bus;
pub mod client;
pub mod config;
pub mod error;
pub mod migrate;
pub mod session;
pub mod store;
pub mod sync;

pub use error::{Result, SyncError};
