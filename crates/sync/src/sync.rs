//! The optimistic-update/rollback state machine.
//!
//! A logical toggle moves through `Idle -> Applying -> Committing ->
//! {Committed | RolledBack}`. The mutation is applied to the in-memory
//! store and published immediately; the durable write (session slot or
//! server record) follows, and a failed write restores the pre-operation
//! state for that id and republishes.
//!
//! Rapid toggles for the same product id coalesce: the newest request
//! supersedes the in-flight one, and the earlier result is discarded when
//! it arrives. This prevents flicker when a visitor double-clicks a heart
//! icon. Operations on different product ids are independent.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::debug;

use wishlist_core::{Image, PriceRange, ProductId, Wishlist, WishlistItem};

use crate::bus::{NotificationBus, WishlistEvent};
use crate::client::{ClientError, RemoteWishlist};
use crate::error::{Result, SyncError};
use crate::session::SessionCache;
use crate::store::ItemStore;

/// Item snapshot supplied by the UI surface when adding.
///
/// The controller stamps `added_at` itself; callers only provide the
/// display fields captured from the product they are looking at.
#[derive(Debug, Clone)]
pub struct ItemDetails {
    pub title: String,
    pub handle: String,
    pub image: Option<Image>,
    pub price_range: Option<PriceRange>,
}

/// The durable backend authoritative for this visitor's wishlist.
///
/// Chosen once per session. Exactly one variant is ever authoritative;
/// the anonymous session slot and the server record are never written by
/// the same controller.
pub enum Backend<C> {
    /// Anonymous visitor: session-scoped storage, no server round-trips.
    Anonymous(SessionCache),
    /// Authenticated visitor: durable server record.
    Authenticated(C),
}

/// How a resolved toggle ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The durable write succeeded (or was best-effort session storage).
    Committed {
        /// Whether the product is in the wishlist after the operation.
        in_wishlist: bool,
        /// Item count after the operation.
        count: usize,
    },
    /// A newer toggle for the same product superseded this one before its
    /// durable write resolved; the result was discarded. Neither an error
    /// nor a commit from this caller's point of view.
    Superseded,
}

/// Placeholder remote for anonymous controllers.
///
/// Anonymous visitors have no server capability at all; this type exists
/// only to name `SyncController<NoRemote>` and is never invoked.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteWishlist for NoRemote {
    async fn load(&self) -> std::result::Result<Wishlist, ClientError> {
        Err(ClientError::NotAuthenticated)
    }

    async fn add(&self, _item: &WishlistItem) -> std::result::Result<Wishlist, ClientError> {
        Err(ClientError::NotAuthenticated)
    }

    async fn remove(&self, _id: &ProductId) -> std::result::Result<Wishlist, ClientError> {
        Err(ClientError::NotAuthenticated)
    }
}

/// The optimistic mutation applied in step one, kept for rollback.
enum Applied {
    Added { item: WishlistItem },
    Removed { index: usize, item: WishlistItem },
}

struct ControllerInner<C> {
    store: Mutex<ItemStore>,
    bus: NotificationBus,
    backend: Backend<C>,
    /// Latest operation id per product, for coalescing.
    inflight: Mutex<HashMap<ProductId, u64>>,
    /// Globally unique operation ids; never reused, so a stale response
    /// can never collide with a later operation's id.
    next_operation: AtomicU64,
}

/// Orchestrates wishlist mutations for one visitor session.
///
/// The controller owns the shared [`ItemStore`] and is the only component
/// permitted to mutate it. Cheaply cloneable via `Arc`; clones share
/// state, so every UI surface can hold one.
pub struct SyncController<C> {
    inner: Arc<ControllerInner<C>>,
}

impl<C> Clone for SyncController<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl SyncController<NoRemote> {
    /// Create a controller for an anonymous visitor backed by the session
    /// cache.
    #[must_use]
    pub fn anonymous(cache: SessionCache, bus: NotificationBus) -> Self {
        Self::new(Backend::Anonymous(cache), bus)
    }
}

impl<C: RemoteWishlist> SyncController<C> {
    /// Create a controller for an authenticated visitor backed by the
    /// durable server record.
    #[must_use]
    pub fn authenticated(client: C, bus: NotificationBus) -> Self {
        Self::new(Backend::Authenticated(client), bus)
    }

    /// Create a controller over an explicit backend.
    #[must_use]
    pub fn new(backend: Backend<C>, bus: NotificationBus) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                store: Mutex::new(ItemStore::new()),
                bus,
                backend,
                inflight: Mutex::new(HashMap::new()),
                next_operation: AtomicU64::new(0),
            }),
        }
    }

    fn store(&self) -> MutexGuard<'_, ItemStore> {
        self.inner.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hydrate the store from the authoritative backend and publish the
    /// initial count.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Remote` if the authenticated load fails. The
    /// anonymous load never fails (missing or corrupt session data is an
    /// empty wishlist).
    pub async fn load(&self) -> Result<()> {
        let wishlist = match &self.inner.backend {
            Backend::Anonymous(cache) => cache.load(),
            Backend::Authenticated(client) => client.load().await?,
        };

        let count = {
            let mut store = self.store();
            store.replace(wishlist);
            store.count()
        };

        self.inner.bus.publish(&WishlistEvent::CountChanged {
            count,
            changed: None,
        });
        Ok(())
    }

    /// Toggle membership for a product.
    ///
    /// Applies the inverse membership optimistically, publishes the new
    /// count immediately, then dispatches the durable write. `details` is
    /// required when the toggle turns out to be an add.
    ///
    /// The durable commit runs on a spawned task: tearing down the UI
    /// surface that initiated the toggle (dropping this future) does not
    /// stop the state machine resolving against the shared store and bus.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::MissingDetails` for an add with no item data,
    /// or `SyncError::Remote` when the server write failed and the
    /// optimistic mutation was rolled back.
    pub async fn toggle(
        &self,
        product_id: ProductId,
        details: Option<&ItemDetails>,
    ) -> Result<ToggleOutcome> {
        // Apply the inverse membership optimistically (step 2-3 of the
        // operation), capturing per-id rollback state.
        let (applied, count, snapshot) = {
            let mut store = self.store();
            let applied = match store.take(&product_id) {
                Some((index, item)) => Applied::Removed { index, item },
                None => {
                    let Some(details) = details else {
                        return Err(SyncError::MissingDetails(product_id));
                    };
                    let item = WishlistItem {
                        id: product_id.clone(),
                        title: details.title.clone(),
                        handle: details.handle.clone(),
                        image: details.image.clone(),
                        price_range: details.price_range.clone(),
                        added_at: Utc::now(),
                    };
                    store.add(item.clone());
                    Applied::Added { item }
                }
            };
            (applied, store.count(), store.snapshot())
        };

        self.inner.bus.publish(&WishlistEvent::CountChanged {
            count,
            changed: Some(product_id.clone()),
        });

        match &self.inner.backend {
            Backend::Anonymous(cache) => {
                // Synchronous, best-effort, never fails the toggle.
                cache.save(&snapshot);
                Ok(ToggleOutcome::Committed {
                    in_wishlist: matches!(applied, Applied::Added { .. }),
                    count,
                })
            }
            Backend::Authenticated(client) => {
                let operation = self.inner.next_operation.fetch_add(1, Ordering::Relaxed) + 1;
                self.inner
                    .inflight
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(product_id.clone(), operation);

                let task = tokio::spawn({
                    let controller = self.clone();
                    let client = client.clone();
                    let product_id = product_id.clone();
                    async move { controller.commit(&client, product_id, operation, applied).await }
                });

                match task.await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        // The commit resolved (or never will) without a
                        // caller to report to; the shared state is already
                        // settled by the task itself.
                        tracing::error!("Commit task did not report back: {e}");
                        Ok(ToggleOutcome::Superseded)
                    }
                }
            }
        }
    }

    /// Run the durable write and resolve the operation against the shared
    /// store.
    async fn commit(
        &self,
        client: &C,
        product_id: ProductId,
        operation: u64,
        applied: Applied,
    ) -> Result<ToggleOutcome> {
        let result = match &applied {
            Applied::Added { item } => client.add(item).await,
            Applied::Removed { .. } => client.remove(&product_id).await,
        };

        // Coalescing: a newer toggle for this id supersedes us; the final
        // desired state wins and this result is discarded, success or not.
        if !self.resolve_if_current(&product_id, operation) {
            debug!(product_id = %product_id, "Discarding stale commit result");
            return Ok(ToggleOutcome::Superseded);
        }

        match result {
            Ok(authoritative) => {
                let republish = {
                    let mut store = self.store();
                    if membership_matches(&store.snapshot(), &authoritative) {
                        None
                    } else {
                        // Server-side dedup or validation produced a
                        // different state than the optimistic guess.
                        store.replace(authoritative);
                        Some(store.count())
                    }
                };

                if let Some(count) = republish {
                    self.inner.bus.publish(&WishlistEvent::CountChanged {
                        count,
                        changed: Some(product_id.clone()),
                    });
                }

                let store = self.store();
                Ok(ToggleOutcome::Committed {
                    in_wishlist: store.contains(&product_id),
                    count: store.count(),
                })
            }
            Err(ClientError::AckedWithoutReload(e)) => {
                // The write landed; only the authoritative re-read failed.
                // Rolling back would diverge from the server, so the
                // optimistic state stands and the next load reconciles.
                tracing::warn!(
                    product_id = %product_id,
                    error = %e,
                    "Mutation committed but reload failed, keeping optimistic state"
                );
                let store = self.store();
                Ok(ToggleOutcome::Committed {
                    in_wishlist: store.contains(&product_id),
                    count: store.count(),
                })
            }
            Err(e) => {
                // Roll back just this id; concurrent optimistic state for
                // other products stays untouched.
                let count = {
                    let mut store = self.store();
                    match applied {
                        Applied::Added { item } => {
                            store.remove(&item.id);
                        }
                        Applied::Removed { index, item } => {
                            store.restore(index, item);
                        }
                    }
                    store.count()
                };

                tracing::warn!(product_id = %product_id, error = %e, "Durable write failed, rolled back");
                self.inner.bus.publish(&WishlistEvent::CountChanged {
                    count,
                    changed: Some(product_id),
                });
                Err(SyncError::Remote(e))
            }
        }
    }

    /// Check whether this operation is still the newest for its product
    /// and, if so, retire it. Operation ids are globally unique so a
    /// retired entry can never be mistaken for a later operation.
    fn resolve_if_current(&self, product_id: &ProductId, operation: u64) -> bool {
        let mut inflight = self
            .inner
            .inflight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match inflight.get(product_id) {
            Some(current) if *current == operation => {
                inflight.remove(product_id);
                true
            }
            _ => false,
        }
    }

    /// Whether the product is currently in the wishlist.
    #[must_use]
    pub fn contains(&self, product_id: &ProductId) -> bool {
        self.store().contains(product_id)
    }

    /// Current item count.
    #[must_use]
    pub fn count(&self) -> usize {
        self.store().count()
    }

    /// Stable copy of the current wishlist for rendering.
    #[must_use]
    pub fn snapshot(&self) -> Wishlist {
        self.store().snapshot()
    }
}

/// Membership comparison: same ids regardless of order. Ordering
/// differences alone do not trigger a reconcile, so in-flight optimistic
/// state for other ids is not clobbered gratuitously.
fn membership_matches(current: &Wishlist, authoritative: &Wishlist) -> bool {
    let mut current_ids = current.ids();
    let mut authoritative_ids = authoritative.ids();
    current_ids.sort();
    authoritative_ids.sort();
    current_ids == authoritative_ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;

    use tokio::sync::oneshot;

    use crate::session::MemorySlot;

    fn item(id: &str) -> WishlistItem {
        WishlistItem {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            handle: format!("product-{id}"),
            image: None,
            price_range: None,
            added_at: "2026-01-01T00:00:00Z".parse().expect("timestamp"),
        }
    }

    fn details(id: &str) -> ItemDetails {
        ItemDetails {
            title: format!("Product {id}"),
            handle: format!("product-{id}"),
            image: None,
            price_range: None,
        }
    }

    /// One scripted remote call: optionally gated on a oneshot, then a
    /// fixed result.
    struct ScriptedCall {
        gate: Option<oneshot::Receiver<()>>,
        result: std::result::Result<Wishlist, ClientError>,
    }

    /// Remote that replays a fixed script of responses in call order.
    #[derive(Clone)]
    struct ScriptedRemote {
        script: Arc<Mutex<VecDeque<ScriptedCall>>>,
    }

    impl ScriptedRemote {
        fn new(calls: impl IntoIterator<Item = ScriptedCall>) -> Self {
            Self {
                script: Arc::new(Mutex::new(calls.into_iter().collect())),
            }
        }

        fn ok(wishlist: Wishlist) -> ScriptedCall {
            ScriptedCall {
                gate: None,
                result: Ok(wishlist),
            }
        }

        fn err(error: ClientError) -> ScriptedCall {
            ScriptedCall {
                gate: None,
                result: Err(error),
            }
        }

        fn gated(
            result: std::result::Result<Wishlist, ClientError>,
        ) -> (ScriptedCall, oneshot::Sender<()>) {
            let (tx, rx) = oneshot::channel();
            (
                ScriptedCall {
                    gate: Some(rx),
                    result,
                },
                tx,
            )
        }

        async fn next(&self) -> std::result::Result<Wishlist, ClientError> {
            let call = self
                .script
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .pop_front()
                .expect("scripted call available");
            if let Some(gate) = call.gate {
                let _ = gate.await;
            }
            call.result
        }
    }

    impl RemoteWishlist for ScriptedRemote {
        async fn load(&self) -> std::result::Result<Wishlist, ClientError> {
            self.next().await
        }

        async fn add(&self, _item: &WishlistItem) -> std::result::Result<Wishlist, ClientError> {
            self.next().await
        }

        async fn remove(&self, _id: &ProductId) -> std::result::Result<Wishlist, ClientError> {
            self.next().await
        }
    }

    /// Collect published counts for assertions.
    fn record_counts(bus: &NotificationBus) -> (Arc<Mutex<Vec<usize>>>, crate::bus::Subscription) {
        let counts = Arc::new(Mutex::new(Vec::new()));
        let sub = {
            let counts = Arc::clone(&counts);
            bus.subscribe(move |event| {
                if let WishlistEvent::CountChanged { count, .. } = event {
                    counts
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .push(*count);
                }
            })
        };
        (counts, sub)
    }

    #[tokio::test]
    async fn test_committed_add_publishes_once() {
        let remote = ScriptedRemote::new([ScriptedRemote::ok(Wishlist::from_items([item("a")]))]);
        let bus = NotificationBus::new();
        let (counts, _sub) = record_counts(&bus);
        let controller = SyncController::authenticated(remote, bus);

        let outcome = controller
            .toggle(ProductId::new("a"), Some(&details("a")))
            .await
            .expect("toggle succeeds");

        assert_eq!(
            outcome,
            ToggleOutcome::Committed {
                in_wishlist: true,
                count: 1,
            }
        );
        assert!(controller.contains(&ProductId::new("a")));
        // Optimistic publish only; membership matched, no reconcile.
        assert_eq!(*counts.lock().expect("lock"), vec![1]);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_and_republishes() {
        let remote = ScriptedRemote::new([ScriptedRemote::err(ClientError::Api {
            status: 503,
            message: "unavailable".to_string(),
        })]);
        let bus = NotificationBus::new();
        let (counts, _sub) = record_counts(&bus);
        let controller = SyncController::authenticated(remote, bus);

        let result = controller
            .toggle(ProductId::new("a"), Some(&details("a")))
            .await;

        assert!(matches!(result, Err(SyncError::Remote(_))));
        assert!(!controller.contains(&ProductId::new("a")));
        assert_eq!(controller.count(), 0);
        // Optimistic count then the reverted count.
        assert_eq!(*counts.lock().expect("lock"), vec![1, 0]);
    }

    #[tokio::test]
    async fn test_acked_write_with_failed_reload_is_not_rolled_back() {
        // The server committed the mutation but the follow-up reload
        // failed; the optimistic state must stand.
        let remote = ScriptedRemote::new([ScriptedRemote::err(ClientError::AckedWithoutReload(
            Box::new(ClientError::Parse("connection reset".to_string())),
        ))]);
        let bus = NotificationBus::new();
        let (counts, _sub) = record_counts(&bus);
        let controller = SyncController::authenticated(remote, bus);

        let outcome = controller
            .toggle(ProductId::new("a"), Some(&details("a")))
            .await
            .expect("toggle succeeds");

        assert_eq!(
            outcome,
            ToggleOutcome::Committed {
                in_wishlist: true,
                count: 1,
            }
        );
        assert!(controller.contains(&ProductId::new("a")));
        // Optimistic publish only, no rollback republish.
        assert_eq!(*counts.lock().expect("lock"), vec![1]);
    }

    #[tokio::test]
    async fn test_rollback_restores_position() {
        let initial = Wishlist::from_items([item("a"), item("b"), item("c")]);
        let remote = ScriptedRemote::new([
            ScriptedRemote::ok(initial.clone()),
            ScriptedRemote::err(ClientError::Api {
                status: 500,
                message: "boom".to_string(),
            }),
        ]);
        let controller = SyncController::authenticated(remote, NotificationBus::new());
        controller.load().await.expect("load");

        let result = controller.toggle(ProductId::new("b"), None).await;

        assert!(matches!(result, Err(SyncError::Remote(_))));
        assert_eq!(controller.snapshot().ids(), initial.ids());
    }

    #[tokio::test]
    async fn test_add_without_details_is_rejected() {
        let remote = ScriptedRemote::new([]);
        let bus = NotificationBus::new();
        let (counts, _sub) = record_counts(&bus);
        let controller = SyncController::authenticated(remote, bus);

        let result = controller.toggle(ProductId::new("a"), None).await;

        assert!(matches!(result, Err(SyncError::MissingDetails(_))));
        assert_eq!(controller.count(), 0);
        assert!(counts.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn test_coalescing_second_toggle_wins() {
        // First toggle (add) stalls on a gate; second toggle (remove)
        // resolves first. The first result must be discarded.
        let (gated, release) = ScriptedRemote::gated(Ok(Wishlist::from_items([item("x")])));
        let remote = ScriptedRemote::new([gated, ScriptedRemote::ok(Wishlist::empty())]);
        let controller = SyncController::authenticated(remote, NotificationBus::new());

        let first = tokio::spawn({
            let controller = controller.clone();
            async move {
                controller
                    .toggle(ProductId::new("x"), Some(&details("x")))
                    .await
            }
        });
        // Let the first toggle apply optimistically and block on its gate.
        tokio::task::yield_now().await;
        assert!(controller.contains(&ProductId::new("x")));

        let second = controller
            .toggle(ProductId::new("x"), None)
            .await
            .expect("second toggle");
        assert_eq!(
            second,
            ToggleOutcome::Committed {
                in_wishlist: false,
                count: 0,
            }
        );

        release.send(()).expect("release gate");
        let first = first.await.expect("join").expect("no error");
        assert_eq!(first, ToggleOutcome::Superseded);

        // Final state is the one implied by the second call.
        assert!(!controller.contains(&ProductId::new("x")));
    }

    #[tokio::test]
    async fn test_stale_failure_is_not_rolled_back() {
        let (gated, release) = ScriptedRemote::gated(Err(ClientError::Api {
            status: 500,
            message: "late failure".to_string(),
        }));
        let remote = ScriptedRemote::new([gated, ScriptedRemote::ok(Wishlist::empty())]);
        let controller = SyncController::authenticated(remote, NotificationBus::new());

        let first = tokio::spawn({
            let controller = controller.clone();
            async move {
                controller
                    .toggle(ProductId::new("x"), Some(&details("x")))
                    .await
            }
        });
        tokio::task::yield_now().await;

        controller
            .toggle(ProductId::new("x"), None)
            .await
            .expect("second toggle");

        release.send(()).expect("release gate");
        let first = first.await.expect("join").expect("stale failure is not an error");
        assert_eq!(first, ToggleOutcome::Superseded);
        assert!(!controller.contains(&ProductId::new("x")));
    }

    #[tokio::test]
    async fn test_reconcile_to_authoritative_snapshot() {
        // Server-side state has an extra item (added on another device).
        let authoritative = Wishlist::from_items([item("a"), item("b")]);
        let remote = ScriptedRemote::new([ScriptedRemote::ok(authoritative.clone())]);
        let bus = NotificationBus::new();
        let (counts, _sub) = record_counts(&bus);
        let controller = SyncController::authenticated(remote, bus);

        let outcome = controller
            .toggle(ProductId::new("a"), Some(&details("a")))
            .await
            .expect("toggle succeeds");

        assert_eq!(
            outcome,
            ToggleOutcome::Committed {
                in_wishlist: true,
                count: 2,
            }
        );
        assert_eq!(controller.snapshot().ids(), authoritative.ids());
        // Optimistic count, then the reconciled count.
        assert_eq!(*counts.lock().expect("lock"), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_anonymous_toggle_is_best_effort_committed() {
        let slot = MemorySlot::new();
        let cache = SessionCache::new(slot.clone());
        let bus = NotificationBus::new();
        let (counts, _sub) = record_counts(&bus);
        let controller = SyncController::anonymous(cache.clone(), bus);

        let outcome = controller
            .toggle(ProductId::new("p1"), Some(&details("p1")))
            .await
            .expect("toggle succeeds");
        assert_eq!(
            outcome,
            ToggleOutcome::Committed {
                in_wishlist: true,
                count: 1,
            }
        );

        // The session slot now holds the snapshot.
        assert!(cache.load().contains(&ProductId::new("p1")));

        let outcome = controller
            .toggle(ProductId::new("p1"), None)
            .await
            .expect("toggle succeeds");
        assert_eq!(
            outcome,
            ToggleOutcome::Committed {
                in_wishlist: false,
                count: 0,
            }
        );
        assert!(cache.load().is_empty());
        assert_eq!(*counts.lock().expect("lock"), vec![1, 0]);
    }

    #[tokio::test]
    async fn test_load_hydrates_and_publishes() {
        let remote = ScriptedRemote::new([ScriptedRemote::ok(Wishlist::from_items([
            item("a"),
            item("b"),
        ]))]);
        let bus = NotificationBus::new();
        let (counts, _sub) = record_counts(&bus);
        let controller = SyncController::authenticated(remote, bus);

        controller.load().await.expect("load");

        assert_eq!(controller.count(), 2);
        assert_eq!(*counts.lock().expect("lock"), vec![2]);
    }

    #[tokio::test]
    async fn test_load_failure_propagates() {
        let remote = ScriptedRemote::new([ScriptedRemote::err(ClientError::NotAuthenticated)]);
        let controller = SyncController::authenticated(remote, NotificationBus::new());

        let result = controller.load().await;
        assert!(matches!(
            result,
            Err(SyncError::Remote(ClientError::NotAuthenticated))
        ));
    }

    #[tokio::test]
    async fn test_dropped_caller_still_resolves_commit() {
        // The toggle future is dropped mid-commit; the spawned task must
        // still resolve the rollback against the shared store.
        let (gated, release) = ScriptedRemote::gated(Err(ClientError::Api {
            status: 500,
            message: "late".to_string(),
        }));
        let remote = ScriptedRemote::new([gated]);
        let controller = SyncController::authenticated(remote, NotificationBus::new());

        let toggle = tokio::spawn({
            let controller = controller.clone();
            async move {
                controller
                    .toggle(ProductId::new("x"), Some(&details("x")))
                    .await
            }
        });
        tokio::task::yield_now().await;
        assert!(controller.contains(&ProductId::new("x")));

        // Tear down the initiating surface.
        toggle.abort();
        let _ = toggle.await;

        release.send(()).expect("release gate");
        // Give the spawned commit a chance to run its rollback.
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert!(!controller.contains(&ProductId::new("x")));
    }

    #[tokio::test]
    async fn test_operations_on_different_ids_are_independent() {
        let (gated, release) = ScriptedRemote::gated(Err(ClientError::Api {
            status: 500,
            message: "only x fails".to_string(),
        }));
        let remote = ScriptedRemote::new([
            gated,
            ScriptedRemote::ok(Wishlist::from_items([item("x"), item("y")])),
        ]);
        let controller = SyncController::authenticated(remote, NotificationBus::new());

        let first = tokio::spawn({
            let controller = controller.clone();
            async move {
                controller
                    .toggle(ProductId::new("x"), Some(&details("x")))
                    .await
            }
        });
        tokio::task::yield_now().await;

        // A toggle on a different id proceeds while x is committing. Its
        // authoritative snapshot includes the optimistic x, so membership
        // matches and nothing is clobbered.
        controller
            .toggle(ProductId::new("y"), Some(&details("y")))
            .await
            .expect("y toggle");

        release.send(()).expect("release gate");
        let first = first.await.expect("join");
        assert!(matches!(first, Err(SyncError::Remote(_))));

        // x rolled back, y kept.
        assert!(!controller.contains(&ProductId::new("x")));
        assert!(controller.contains(&ProductId::new("y")));
    }

    #[test]
    fn test_membership_matches_ignores_order() {
        let a = Wishlist::from_items([item("a"), item("b")]);
        let b = Wishlist::from_items([item("b"), item("a")]);
        let c = Wishlist::from_items([item("a")]);

        assert!(membership_matches(&a, &b));
        assert!(!membership_matches(&a, &c));
    }

    #[tokio::test]
    async fn test_toggle_count_events_monotonic_per_surface() {
        // Smoke test that subscribers see counts in publish order.
        let remote = ScriptedRemote::new([
            ScriptedRemote::ok(Wishlist::from_items([item("a")])),
            ScriptedRemote::ok(Wishlist::from_items([item("a"), item("b")])),
        ]);
        let bus = NotificationBus::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let _sub = {
            let seen = Arc::clone(&seen);
            bus.subscribe(move |event| {
                if let WishlistEvent::CountChanged { count, .. } = event {
                    seen.store(*count, Ordering::SeqCst);
                }
            })
        };
        let controller = SyncController::authenticated(remote, bus);

        controller
            .toggle(ProductId::new("a"), Some(&details("a")))
            .await
            .expect("toggle a");
        controller
            .toggle(ProductId::new("b"), Some(&details("b")))
            .await
            .expect("toggle b");

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}
