//! One-shot merge of the anonymous session wishlist into the durable
//! server record at the login transition.
//!
//! Runs exactly once when a login is observed, never again for that
//! session. Partial-success policy: a single failed item is reported but
//! never rolls back already-migrated items, and the session cache is
//! consumed (cleared) regardless so a permanently-failing item cannot
//! cause an infinite retry loop.

use tracing::{info, instrument, warn};

use wishlist_core::{ProductId, Wishlist, WishlistItem};

use crate::client::{ClientError, RemoteWishlist};
use crate::session::SessionCache;

/// Failure migrating one item; the rest of the batch continues.
#[derive(Debug)]
pub struct MigrationFailure {
    /// The item that failed to migrate.
    pub product_id: ProductId,
    /// Why the server rejected it.
    pub error: ClientError,
}

/// Result of a completed (possibly partial) migration.
#[derive(Debug)]
pub struct MigrationReport {
    /// The merged wishlist the migration tried to establish server-side.
    pub merged: Wishlist,
    /// Items successfully written to the server record.
    pub migrated: Vec<ProductId>,
    /// Per-item failures.
    pub failures: Vec<MigrationFailure>,
}

impl MigrationReport {
    /// Whether every item that needed a server write got one.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Reconciles an anonymous session wishlist into a newly authenticated
/// visitor's durable record.
pub struct MigrationAdapter<'a, C> {
    cache: &'a SessionCache,
    client: &'a C,
}

impl<'a, C: RemoteWishlist> MigrationAdapter<'a, C> {
    /// Create an adapter over the session cache being consumed and the
    /// authenticated client receiving it.
    #[must_use]
    pub const fn new(cache: &'a SessionCache, client: &'a C) -> Self {
        Self { cache, client }
    }

    /// Run the migration.
    ///
    /// Computes the union of the session and server wishlists keyed by id
    /// (earlier `added_at` wins for ids on both sides), writes every entry
    /// the server is missing or holds with a later timestamp, and clears
    /// the session slot. Per-item failures are collected, not fatal.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` only if the initial server load fails - in
    /// that case no mutation has happened and the session cache is kept
    /// for a later attempt.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<MigrationReport, ClientError> {
        let local = self.cache.load();
        let server = self.client.load().await?;

        let merged = merge_earliest(&local, &server);

        let mut migrated = Vec::new();
        let mut failures = Vec::new();

        for item in merged.iter() {
            if !needs_server_write(item, &server) {
                continue;
            }

            match self.client.add(item).await {
                Ok(_) => migrated.push(item.id.clone()),
                // The write committed; only the follow-up reload failed.
                Err(ClientError::AckedWithoutReload(error)) => {
                    warn!(product_id = %item.id, %error, "Migrated item but reload failed");
                    migrated.push(item.id.clone());
                }
                Err(error) => {
                    warn!(product_id = %item.id, %error, "Failed to migrate item");
                    failures.push(MigrationFailure {
                        product_id: item.id.clone(),
                        error,
                    });
                }
            }
        }

        // The anonymous cache is consumed even on partial failure; it is
        // never retried or replayed.
        self.cache.clear();

        info!(
            migrated = migrated.len(),
            failed = failures.len(),
            "Session wishlist migration finished"
        );

        Ok(MigrationReport {
            merged,
            migrated,
            failures,
        })
    }
}

/// Union of two wishlists keyed by id.
///
/// Server entries keep their insertion order and come first; local-only
/// entries follow in their own order. For ids present on both sides the
/// entry with the earlier `added_at` wins - the visitor wanted it first.
fn merge_earliest(local: &Wishlist, server: &Wishlist) -> Wishlist {
    let mut merged: Vec<WishlistItem> = Vec::new();

    for server_item in server.iter() {
        let winner = match local.get(&server_item.id) {
            Some(local_item) if local_item.added_at < server_item.added_at => local_item,
            _ => server_item,
        };
        merged.push(winner.clone());
    }

    for local_item in local.iter() {
        if !server.contains(&local_item.id) {
            merged.push(local_item.clone());
        }
    }

    Wishlist::from_items(merged)
}

/// Whether the merged entry differs from what the server already holds.
fn needs_server_write(item: &WishlistItem, server: &Wishlist) -> bool {
    match server.get(&item.id) {
        // Shared id where the local timestamp won: backdate server-side.
        Some(existing) => item.added_at < existing.added_at,
        // Local-only item: append.
        None => true,
    }
}
