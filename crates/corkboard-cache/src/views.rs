//! The cache store — named query views with patch/undo and live-feed resync.
//!
//! Each [`ViewKey`] addresses one cached card list: the board-wide view or a
//! single column's view. Multiple views may contain the same logical card;
//! mutators patch every view the card could belong to and get back one
//! combined [`Undo`].
//!
//! # Convergence model
//!
//! The live feed is the source of truth. Whenever it emits a snapshot for a
//! key, that view's list is replaced **wholesale** (never merged) and its
//! version bumps. Optimistic patches also bump the version; an [`Undo`] only
//! restores a view whose version still matches the stamp taken at patch time,
//! so a rollback that lost the race against a resync is a logged no-op
//! instead of reapplying stale state.
//!
//! # Lifecycle
//!
//! Views are reference-counted: the first [`CacheStore::subscribe`] for a key
//! starts the external feed, the last dropped [`ViewSubscription`] stops it
//! and tears the view down.

use std::fmt;
use std::sync::{Arc, Weak};

use corkboard_types::{BoardId, Card, CardId, ColumnId, RawDocument};
use indexmap::IndexMap;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

use crate::normalize::normalize_card;

/// Broadcast depth per view. A lagging subscriber skips to the next snapshot
/// rather than erroring, so the channel only needs to absorb bursts.
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// Address of one cached query view.
#[derive(Clone, Hash, Eq, PartialEq)]
pub struct ViewKey {
    pub board_id: BoardId,
    /// `None` = the board-wide card list; `Some` = one column's list.
    pub column_id: Option<ColumnId>,
}

impl ViewKey {
    /// The board-wide card view.
    pub fn board(board_id: BoardId) -> Self {
        Self { board_id, column_id: None }
    }

    /// A single column's card view.
    pub fn column(board_id: BoardId, column_id: ColumnId) -> Self {
        Self { board_id, column_id: Some(column_id) }
    }

    /// Whether this key addresses a per-column view.
    pub fn is_column_view(&self) -> bool {
        self.column_id.is_some()
    }
}

impl fmt::Display for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.column_id {
            Some(col) => write!(f, "cards/{}/{}", self.board_id, col),
            None => write!(f, "cards/{}", self.board_id),
        }
    }
}

impl fmt::Debug for ViewKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ViewKey({self})")
    }
}

/// Sort a card list ascending by fractional order.
///
/// Stable: transiently equal keys keep their relative positions.
pub fn sort_cards_by_order(cards: &mut [Card]) {
    cards.sort_by(|a, b| a.order.total_cmp(&b.order));
}

// ============================================================================
// Live feed boundary
// ============================================================================

/// External push-based subscription source (the hosted document store).
///
/// Implementations must deliver the **full current result set** into the
/// sink on every backing-data change; this store expects no incremental
/// diffs.
pub trait LiveFeed: Send + Sync {
    /// Start a feed for one view. Dropping the returned handle stops it.
    fn subscribe(&self, key: &ViewKey, sink: FeedSink) -> FeedHandle;
}

/// Stops a running feed when dropped.
pub struct FeedHandle {
    stop: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl FeedHandle {
    /// Wrap the feed's unsubscribe callback.
    pub fn new(stop: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self { stop: Some(Box::new(stop)) }
    }

    /// A handle with nothing to stop (tests, already-terminated feeds).
    pub fn detached() -> Self {
        Self { stop: None }
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            stop();
        }
    }
}

/// Where a [`LiveFeed`] delivers snapshots and errors for one view.
///
/// Raw documents are normalized here, at the store boundary, so feed
/// implementations never touch domain types.
#[derive(Clone)]
pub struct FeedSink {
    store: Weak<RwLock<StoreInner>>,
    key: ViewKey,
}

impl FeedSink {
    /// Deliver a full snapshot of `(document id, raw document)` pairs.
    ///
    /// Replaces the view's list wholesale and bumps its version — the
    /// authoritative resync path that supersedes any optimistic patch.
    pub fn snapshot(&self, docs: Vec<(String, RawDocument)>) {
        let Some(inner) = self.store.upgrade() else {
            return;
        };
        let mut cards: Vec<Card> = docs
            .iter()
            .map(|(id, doc)| normalize_card(&self.key.board_id, id, doc))
            .collect();
        if self.key.is_column_view() {
            sort_cards_by_order(&mut cards);
        }
        let mut guard = inner.write();
        let Some(slot) = guard.views.get_mut(&self.key) else {
            trace!(view = %self.key, "snapshot for torn-down view dropped");
            return;
        };
        slot.cards = cards;
        slot.version += 1;
        slot.notify();
    }

    /// Report a feed error. The view keeps its stale contents.
    pub fn error(&self, message: &str) {
        warn!(view = %self.key, message, "live feed error; keeping stale view");
    }
}

// ============================================================================
// Store internals
// ============================================================================

struct ViewSlot {
    cards: Vec<Card>,
    /// Bumped on every mutation (patch, undo, resync). Undo guard compares
    /// against this.
    version: u64,
    refcount: usize,
    tx: broadcast::Sender<Vec<Card>>,
    feed: Option<FeedHandle>,
}

impl ViewSlot {
    fn new() -> Self {
        let (tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);
        Self { cards: Vec::new(), version: 0, refcount: 0, tx, feed: None }
    }

    fn notify(&self) {
        // Send fails only when no receiver is alive; nothing to do then.
        let _ = self.tx.send(self.cards.clone());
    }
}

struct StoreInner {
    views: IndexMap<ViewKey, ViewSlot>,
}

/// In-memory, subscription-based cache of card query views.
///
/// Cheap to clone; all clones share one store. The store is only ever
/// mutated through [`subscribe`](Self::subscribe), [`patch`](Self::patch),
/// undo reverts, and feed snapshots — callers never reach into a view's
/// list directly.
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<RwLock<StoreInner>>,
    feed: Arc<dyn LiveFeed>,
}

impl CacheStore {
    /// Create a store backed by the given live feed.
    pub fn new(feed: Arc<dyn LiveFeed>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner { views: IndexMap::new() })),
            feed,
        }
    }

    /// Subscribe to a view, creating it (and starting its feed) on first use.
    pub fn subscribe(&self, key: &ViewKey) -> ViewSubscription {
        let (rx, snapshot, first) = {
            let mut guard = self.inner.write();
            let slot = guard.views.entry(key.clone()).or_insert_with(ViewSlot::new);
            slot.refcount += 1;
            (slot.tx.subscribe(), slot.cards.clone(), slot.refcount == 1)
        };

        if first {
            debug!(view = %key, "starting live feed");
            // The feed may deliver synchronously, so hold no lock here.
            let sink = FeedSink { store: Arc::downgrade(&self.inner), key: key.clone() };
            let handle = self.feed.subscribe(key, sink);
            let mut guard = self.inner.write();
            if let Some(slot) = guard.views.get_mut(key) {
                slot.feed = Some(handle);
            }
            // Slot already gone: every subscriber dropped between the two
            // locks; the handle drops here and stops the feed.
        }

        ViewSubscription {
            key: key.clone(),
            snapshot,
            rx,
            _guard: ViewGuard { store: Arc::downgrade(&self.inner), key: key.clone() },
        }
    }

    /// Apply a synchronous transformation to a view's list.
    ///
    /// Returns an [`Undo`] that restores the pre-patch list, captured by
    /// value. A key with no active view is a cache miss: the patch is
    /// skipped and the undo is empty (the next resync corrects divergence).
    pub fn patch(&self, key: &ViewKey, mutate: impl FnOnce(&mut Vec<Card>)) -> Undo {
        let mut guard = self.inner.write();
        let Some(slot) = guard.views.get_mut(key) else {
            trace!(view = %key, "patch skipped: view not cached");
            return Undo::empty();
        };
        let before = slot.cards.clone();
        mutate(&mut slot.cards);
        slot.version += 1;
        let stamp = slot.version;
        slot.notify();
        Undo {
            entries: vec![UndoEntry {
                store: Arc::downgrade(&self.inner),
                key: key.clone(),
                before,
                stamp,
            }],
        }
    }

    /// Current list for a view, if cached.
    pub fn get(&self, key: &ViewKey) -> Option<Vec<Card>> {
        self.inner.read().views.get(key).map(|s| s.cards.clone())
    }

    /// Look up one card, preferring the board-wide view and falling back to
    /// any cached column view of the same board.
    pub fn find_card(&self, board_id: &BoardId, card_id: &CardId) -> Option<Card> {
        let guard = self.inner.read();
        if let Some(slot) = guard.views.get(&ViewKey::board(board_id.clone()))
            && let Some(card) = slot.cards.iter().find(|c| c.id == *card_id)
        {
            return Some(card.clone());
        }
        guard
            .views
            .iter()
            .filter(|(k, _)| k.board_id == *board_id && k.is_column_view())
            .flat_map(|(_, slot)| slot.cards.iter())
            .find(|c| c.id == *card_id)
            .cloned()
    }

    /// Column ids with an active cached view on this board, in subscription
    /// order.
    pub fn active_columns(&self, board_id: &BoardId) -> Vec<ColumnId> {
        self.inner
            .read()
            .views
            .keys()
            .filter(|k| k.board_id == *board_id)
            .filter_map(|k| k.column_id.clone())
            .collect()
    }

    /// Version counter of a view, if cached. Test and diagnostics surface.
    pub fn version(&self, key: &ViewKey) -> Option<u64> {
        self.inner.read().views.get(key).map(|s| s.version)
    }

    /// Live subscriber count for a view.
    pub fn subscriber_count(&self, key: &ViewKey) -> usize {
        self.inner.read().views.get(key).map(|s| s.refcount).unwrap_or(0)
    }
}

// ============================================================================
// Subscriptions
// ============================================================================

/// A live handle on one view: the snapshot taken at subscribe time plus a
/// receiver for every subsequent update. Dropping it releases the view's
/// refcount (and stops the feed when it was the last one).
pub struct ViewSubscription {
    key: ViewKey,
    snapshot: Vec<Card>,
    rx: broadcast::Receiver<Vec<Card>>,
    _guard: ViewGuard,
}

impl ViewSubscription {
    /// The view this subscription tracks.
    pub fn key(&self) -> &ViewKey {
        &self.key
    }

    /// The list as of subscribe time.
    pub fn snapshot(&self) -> &[Card] {
        &self.snapshot
    }

    /// Wait for the next update. `None` when the view was torn down.
    ///
    /// A lagged receiver skips ahead to the newest snapshot — intermediate
    /// states are full snapshots too, so nothing is lost by skipping.
    pub async fn recv(&mut self) -> Option<Vec<Card>> {
        loop {
            match self.rx.recv().await {
                Ok(cards) => return Some(cards),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    trace!(view = %self.key, skipped, "subscriber lagged; catching up");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

struct ViewGuard {
    store: Weak<RwLock<StoreInner>>,
    key: ViewKey,
}

impl Drop for ViewGuard {
    fn drop(&mut self) {
        let Some(inner) = self.store.upgrade() else {
            return;
        };
        let feed = {
            let mut guard = inner.write();
            let Some(slot) = guard.views.get_mut(&self.key) else {
                return;
            };
            slot.refcount = slot.refcount.saturating_sub(1);
            if slot.refcount > 0 {
                return;
            }
            debug!(view = %self.key, "last subscriber gone; stopping feed");
            guard.views.swap_remove(&self.key).and_then(|s| s.feed)
        };
        // Stop the feed after releasing the lock; its unsubscribe callback
        // may touch the store.
        drop(feed);
    }
}

// ============================================================================
// Undo
// ============================================================================

/// Reverses one optimistic mutation across every view it patched.
///
/// Each sub-entry holds the pre-patch list by value plus the version stamped
/// at patch time. Reverting restores a view only while its version still
/// matches — once a resync (or any later mutation) has touched the view, the
/// captured list is stale and the revert becomes a logged no-op.
#[must_use = "dropping an Undo forfeits the rollback path"]
pub struct Undo {
    entries: Vec<UndoEntry>,
}

struct UndoEntry {
    store: Weak<RwLock<StoreInner>>,
    key: ViewKey,
    before: Vec<Card>,
    stamp: u64,
}

impl Undo {
    /// An undo with nothing to revert (cache-miss patches).
    pub fn empty() -> Self {
        Self { entries: Vec::new() }
    }

    /// Fold another mutation's undo into this one.
    ///
    /// Sub-entries target disjoint storage, so revert order is irrelevant.
    pub fn merge(&mut self, other: Undo) {
        self.entries.extend(other.entries);
    }

    /// Whether any view was actually patched.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of patched views.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Restore every patched view that has not moved on since the patch.
    pub fn revert(self) {
        for entry in self.entries {
            let Some(inner) = entry.store.upgrade() else {
                continue;
            };
            let mut guard = inner.write();
            let Some(slot) = guard.views.get_mut(&entry.key) else {
                continue;
            };
            if slot.version != entry.stamp {
                debug!(
                    view = %entry.key,
                    stamped = entry.stamp,
                    current = slot.version,
                    "rollback skipped: view superseded since patch"
                );
                continue;
            }
            slot.cards = entry.before;
            slot.version += 1;
            slot.notify();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use corkboard_types::UserId;
    use serde_json::json;

    use super::*;

    /// Feed double: records sinks so tests can push snapshots, and counts
    /// stopped feeds.
    struct MockFeed {
        sinks: parking_lot::Mutex<Vec<(ViewKey, FeedSink)>>,
        stopped: Arc<AtomicUsize>,
    }

    impl MockFeed {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sinks: parking_lot::Mutex::new(Vec::new()),
                stopped: Arc::new(AtomicUsize::new(0)),
            })
        }

        fn emit(&self, key: &ViewKey, docs: Vec<(&str, serde_json::Value)>) {
            let sinks = self.sinks.lock();
            let (_, sink) = sinks
                .iter()
                .rev()
                .find(|(k, _)| k == key)
                .expect("no feed started for view");
            let docs = docs
                .into_iter()
                .map(|(id, v)| (id.to_string(), v.as_object().cloned().expect("object")))
                .collect();
            sink.snapshot(docs);
        }

        fn started(&self) -> usize {
            self.sinks.lock().len()
        }

        fn stopped(&self) -> usize {
            self.stopped.load(Ordering::SeqCst)
        }
    }

    impl LiveFeed for MockFeed {
        fn subscribe(&self, key: &ViewKey, sink: FeedSink) -> FeedHandle {
            self.sinks.lock().push((key.clone(), sink));
            let stopped = self.stopped.clone();
            FeedHandle::new(move || {
                stopped.fetch_add(1, Ordering::SeqCst);
            })
        }
    }

    fn board() -> BoardId {
        BoardId::from("b1")
    }

    fn card(id: &str, column: &str, order: f64) -> Card {
        let mut c = Card::with_id(
            CardId::from(id),
            board(),
            ColumnId::from(column),
            id.to_string(),
            UserId::from("u1"),
        );
        c.order = order;
        c
    }

    fn store_with_feed() -> (CacheStore, Arc<MockFeed>) {
        let feed = MockFeed::new();
        (CacheStore::new(feed.clone()), feed)
    }

    #[test]
    fn store_and_sink_are_thread_safe() {
        // Feed implementations hold sinks across threads, so the whole
        // store stack has to be Send + Sync.
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CacheStore>();
        assert_send_sync::<FeedSink>();
        assert_send_sync::<FeedHandle>();
    }

    #[test]
    fn first_subscriber_starts_feed_once() {
        let (store, feed) = store_with_feed();
        let key = ViewKey::board(board());
        let sub_a = store.subscribe(&key);
        let sub_b = store.subscribe(&key);
        assert_eq!(feed.started(), 1);
        assert_eq!(store.subscriber_count(&key), 2);
        drop(sub_a);
        assert_eq!(store.subscriber_count(&key), 1);
        drop(sub_b);
        assert_eq!(store.subscriber_count(&key), 0);
        assert_eq!(store.get(&key), None);
        assert_eq!(feed.stopped(), 1);
    }

    #[test]
    fn snapshot_replaces_wholesale_and_sorts_column_views() {
        let (store, feed) = store_with_feed();
        let key = ViewKey::column(board(), ColumnId::from("todo"));
        let _sub = store.subscribe(&key);

        feed.emit(
            &key,
            vec![
                ("b", json!({"title": "b", "columnId": "todo", "order": 20.0})),
                ("a", json!({"title": "a", "columnId": "todo", "order": 10.0})),
            ],
        );
        let cards = store.get(&key).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].id.as_str(), "a");
        assert_eq!(cards[1].id.as_str(), "b");

        // Second snapshot does not merge with the first.
        feed.emit(&key, vec![("c", json!({"title": "c", "columnId": "todo", "order": 5.0}))]);
        let cards = store.get(&key).unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].id.as_str(), "c");
    }

    #[test]
    fn patch_and_revert_restore_exact_content() {
        let (store, _feed) = store_with_feed();
        let key = ViewKey::board(board());
        let _sub = store.subscribe(&key);
        let _ = store.patch(&key, |cards| cards.push(card("a", "todo", 10.0)));
        let baseline = store.get(&key).unwrap();

        let undo = store.patch(&key, |cards| {
            cards.push(card("x", "todo", 20.0));
            cards[0].title = "renamed".into();
        });
        assert_eq!(undo.len(), 1);
        assert_ne!(store.get(&key).unwrap(), baseline);

        undo.revert();
        assert_eq!(store.get(&key).unwrap(), baseline);
    }

    #[test]
    fn revert_is_noop_after_resync_supersedes_the_patch() {
        let (store, feed) = store_with_feed();
        let key = ViewKey::board(board());
        let _sub = store.subscribe(&key);

        let undo = store.patch(&key, |cards| cards.push(card("x", "todo", 20.0)));

        // Authoritative resync arrives before the rollback.
        feed.emit(&key, vec![("fresh", json!({"title": "fresh", "order": 1.0}))]);
        let resynced = store.get(&key).unwrap();

        undo.revert();
        assert_eq!(store.get(&key).unwrap(), resynced);
    }

    #[test]
    fn patch_on_uncached_view_is_a_skip() {
        let (store, _feed) = store_with_feed();
        let key = ViewKey::column(board(), ColumnId::from("nowhere"));
        let undo = store.patch(&key, |cards| cards.push(card("x", "nowhere", 1.0)));
        assert!(undo.is_empty());
        assert_eq!(store.get(&key), None);
        undo.revert();
    }

    #[test]
    fn merged_undo_reverts_independent_views() {
        let (store, _feed) = store_with_feed();
        let board_key = ViewKey::board(board());
        let col_key = ViewKey::column(board(), ColumnId::from("todo"));
        let _s1 = store.subscribe(&board_key);
        let _s2 = store.subscribe(&col_key);

        let mut undo = store.patch(&board_key, |cards| cards.push(card("a", "todo", 10.0)));
        undo.merge(store.patch(&col_key, |cards| cards.push(card("a", "todo", 10.0))));
        assert_eq!(undo.len(), 2);

        undo.revert();
        assert_eq!(store.get(&board_key).unwrap(), Vec::<Card>::new());
        assert_eq!(store.get(&col_key).unwrap(), Vec::<Card>::new());
    }

    #[test]
    fn find_card_falls_back_to_column_views() {
        let (store, _feed) = store_with_feed();
        let col_key = ViewKey::column(board(), ColumnId::from("todo"));
        let _sub = store.subscribe(&col_key);
        let _ = store.patch(&col_key, |cards| cards.push(card("a", "todo", 10.0)));

        let found = store.find_card(&board(), &CardId::from("a")).unwrap();
        assert_eq!(found.id.as_str(), "a");
        assert!(store.find_card(&board(), &CardId::from("ghost")).is_none());
    }

    #[test]
    fn active_columns_lists_cached_column_views_only() {
        let (store, _feed) = store_with_feed();
        let _s1 = store.subscribe(&ViewKey::board(board()));
        let _s2 = store.subscribe(&ViewKey::column(board(), ColumnId::from("todo")));
        let _s3 = store.subscribe(&ViewKey::column(board(), ColumnId::from("done")));
        let _other = store.subscribe(&ViewKey::column(BoardId::from("b2"), ColumnId::from("todo")));

        let cols = store.active_columns(&board());
        assert_eq!(cols, vec![ColumnId::from("todo"), ColumnId::from("done")]);
    }

    #[tokio::test]
    async fn subscribers_receive_every_update() {
        let (store, feed) = store_with_feed();
        let key = ViewKey::board(board());
        let mut sub = store.subscribe(&key);
        assert!(sub.snapshot().is_empty());

        feed.emit(&key, vec![("a", json!({"title": "a", "order": 1.0}))]);
        let cards = sub.recv().await.unwrap();
        assert_eq!(cards.len(), 1);

        let _ = store.patch(&key, |cards| cards.push(card("b", "todo", 2.0)));
        let cards = sub.recv().await.unwrap();
        assert_eq!(cards.len(), 2);
    }
}
