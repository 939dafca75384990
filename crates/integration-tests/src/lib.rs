//! Integration test support for the wishlist synchronization core.
//!
//! Provides a mock wishlist server implementing the `RemoteWishlist`
//! contract against an in-memory record, with hooks for gating individual
//! mutations (to exercise coalescing) and injecting per-item failures.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p wishlist-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::oneshot;

use wishlist_core::{ProductId, Wishlist, WishlistItem};
use wishlist_sync::client::{ClientError, RemoteWishlist};

/// Initialize tracing for a test binary. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Build a test item with a fixed timestamp.
#[must_use]
pub fn item(id: &str, added_at: &str) -> WishlistItem {
    WishlistItem {
        id: ProductId::new(id),
        title: format!("Product {id}"),
        handle: format!("product-{id}"),
        image: None,
        price_range: None,
        added_at: added_at.parse::<DateTime<Utc>>().expect("valid timestamp"),
    }
}

#[derive(Default)]
struct ServerState {
    record: Vec<WishlistItem>,
    failing: Vec<ProductId>,
    gates: VecDeque<oneshot::Receiver<()>>,
    mutation_count: usize,
}

/// Mock wishlist server holding an in-memory durable record.
///
/// Mutations apply the same semantics the real endpoint promises: add
/// appends if absent (an earlier `addedAt` on a re-add backdates the
/// entry), remove deletes if present, and both return the authoritative
/// post-mutation record.
#[derive(Clone, Default)]
pub struct MockWishlistServer {
    state: Arc<Mutex<ServerState>>,
}

impl MockWishlistServer {
    /// Create a server with an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a server whose record already holds these items.
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = WishlistItem>) -> Self {
        let server = Self::new();
        server.lock().record = items.into_iter().collect();
        server
    }

    /// Make mutations for these ids fail with a validation error.
    pub fn fail_ids(&self, ids: impl IntoIterator<Item = ProductId>) {
        self.lock().failing = ids.into_iter().collect();
    }

    /// Gate the next mutation: it will not resolve until the returned
    /// sender fires. Gates apply to mutations in arrival order.
    #[must_use = "the gated mutation stays pending until the sender fires"]
    pub fn gate_next_mutation(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.lock().gates.push_back(rx);
        tx
    }

    /// Authoritative snapshot of the server record.
    #[must_use]
    pub fn record(&self) -> Wishlist {
        Wishlist::from_items(self.lock().record.clone())
    }

    /// Number of mutations the server has processed.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.lock().mutation_count
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn wait_for_gate(&self) {
        let gate = self.lock().gates.pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
    }

    fn check_failing(&self, id: &ProductId) -> Result<(), ClientError> {
        if self.lock().failing.contains(id) {
            return Err(ClientError::Validation(format!("rejected: {id}")));
        }
        Ok(())
    }
}

impl RemoteWishlist for MockWishlistServer {
    async fn load(&self) -> Result<Wishlist, ClientError> {
        Ok(self.record())
    }

    async fn add(&self, item: &WishlistItem) -> Result<Wishlist, ClientError> {
        self.wait_for_gate().await;
        self.check_failing(&item.id)?;

        {
            let mut state = self.lock();
            state.mutation_count += 1;
            if let Some(existing) = state.record.iter_mut().find(|existing| existing.id == item.id)
            {
                if item.added_at < existing.added_at {
                    *existing = item.clone();
                }
            } else {
                state.record.push(item.clone());
            }
        }
        Ok(self.record())
    }

    async fn remove(&self, id: &ProductId) -> Result<Wishlist, ClientError> {
        self.wait_for_gate().await;
        self.check_failing(id)?;

        {
            let mut state = self.lock();
            state.mutation_count += 1;
            state.record.retain(|item| &item.id != id);
        }
        Ok(self.record())
    }
}
