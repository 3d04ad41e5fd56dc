// Query cache with tag-based invalidation.
// De-duplicates in-flight requests, refetches stale entries, and notifies subscribers.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::api::{Envelope, Mutation, Query, QueryData, Transport};
use crate::error::Result;

use super::entry::CacheEntry;
use super::tags::Tag;

/// How long an entry with no subscribers is kept before it may be evicted.
pub const DEFAULT_KEEP_UNUSED_FOR: Duration = Duration::from_secs(60);

/// Callback invoked with the new entry on every state transition.
pub type Callback = Arc<dyn Fn(&CacheEntry) + Send + Sync>;

/// Handle returned by [`QueryCache::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    query: Query,
    id: u64,
}

impl Subscription {
    pub fn query(&self) -> &Query {
        &self.query
    }
}

/// Receives the settled entry of an in-flight fetch.
type Settled = watch::Receiver<Option<CacheEntry>>;

struct Slot {
    entry: CacheEntry,
    subscribers: Vec<(u64, Callback)>,
    in_flight: Option<Settled>,
    /// Invalidated while in flight; fetch again once the current request settles.
    refetch_queued: bool,
    /// When the last subscriber left (or the slot was created without one).
    idle_since: Option<Instant>,
    /// Sequence number of the last notice captured for this slot.
    version: u64,
    /// Sequence number of the last notice handed to subscribers.
    delivered: Arc<Mutex<u64>>,
}

impl Slot {
    fn new(query: Query) -> Self {
        Self {
            entry: CacheEntry::new(query),
            subscribers: Vec::new(),
            in_flight: None,
            refetch_queued: false,
            idle_since: Some(Instant::now()),
            version: 0,
            delivered: Arc::new(Mutex::new(0)),
        }
    }

    fn notice(&mut self) -> Notice {
        self.version += 1;
        Notice {
            entry: self.entry.clone(),
            callbacks: self.subscribers.iter().map(|(_, cb)| cb.clone()).collect(),
            version: self.version,
            delivered: self.delivered.clone(),
        }
    }
}

/// A notification captured under the lock and delivered after it is released.
struct Notice {
    entry: CacheEntry,
    callbacks: Vec<Callback>,
    version: u64,
    delivered: Arc<Mutex<u64>>,
}

impl Notice {
    /// Deliveries for one slot are serialised, and a notice older than one
    /// already delivered is dropped, so subscribers never step back in time.
    fn deliver(self) {
        let mut delivered = self
            .delivered
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if self.version <= *delivered {
            return;
        }
        *delivered = self.version;
        for callback in &self.callbacks {
            callback(&self.entry);
        }
    }
}

/// A request whose loading transition is captured but not yet running.
/// Spawned only after that transition is delivered.
struct PendingFetch {
    cache: QueryCache,
    query: Query,
    tx: watch::Sender<Option<CacheEntry>>,
}

impl PendingFetch {
    fn spawn(self) {
        let PendingFetch { cache, query, tx } = self;
        tokio::spawn(async move {
            let result = cache
                .transport
                .send(query.request())
                .await
                .and_then(Envelope::ensure_success)
                .and_then(|envelope| query.decode(envelope));
            cache.settle(query, result, tx);
        });
    }
}

#[derive(Default)]
struct CacheState {
    slots: HashMap<Query, Slot>,
    next_subscription: u64,
}

impl CacheState {
    fn slot(&mut self, query: &Query) -> &mut Slot {
        self.slots
            .entry(query.clone())
            .or_insert_with(|| Slot::new(query.clone()))
    }
}

/// Cache of query results keyed by query, shared by cloning.
///
/// Fetches run as detached tokio tasks, so a caller that stops waiting never
/// aborts a request; its result is still cached.
#[derive(Clone)]
pub struct QueryCache {
    transport: Arc<dyn Transport>,
    state: Arc<Mutex<CacheState>>,
    keep_unused_for: Duration,
}

impl fmt::Debug for QueryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache")
            .field("entries", &self.len())
            .field("keep_unused_for", &self.keep_unused_for)
            .finish()
    }
}

impl QueryCache {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(CacheState::default())),
            keep_unused_for: DEFAULT_KEEP_UNUSED_FOR,
        }
    }

    /// Set the idle window used by [`collect_garbage`](Self::collect_garbage).
    pub fn with_keep_unused_for(mut self, keep_unused_for: Duration) -> Self {
        self.keep_unused_for = keep_unused_for;
        self
    }

    pub fn keep_unused_for(&self) -> Duration {
        self.keep_unused_for
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the cached entry for `query`, fetching it if missing or stale.
    ///
    /// Concurrent calls for the same query share one request.
    pub async fn query(&self, query: Query) -> CacheEntry {
        let (mut settled, started) = {
            let mut state = self.lock();
            let slot = state.slot(&query);
            if let Some(in_flight) = &slot.in_flight {
                debug!(%query, "joining in-flight request");
                (in_flight.clone(), None)
            } else if slot.entry.is_fresh() {
                debug!(%query, "cache hit");
                return slot.entry.clone();
            } else {
                let (settled, notice, fetch) = self.start_fetch(slot);
                (settled, Some((notice, fetch)))
            }
        };

        if let Some((notice, fetch)) = started {
            notice.deliver();
            fetch.spawn();
        }
        self.wait_settled(&query, &mut settled).await
    }

    /// Mark `query` stale and fetch it again. Untagged queries need this to refresh.
    pub async fn refetch(&self, query: Query) -> CacheEntry {
        self.lock().slot(&query).entry.mark_stale();
        self.query(query).await
    }

    /// Run a mutation, then invalidate the tags it declares.
    ///
    /// A failed mutation invalidates nothing and its error goes back to the caller.
    pub async fn mutate(&self, mutation: Mutation) -> Result<String> {
        info!(mutation = mutation.name(), "executing mutation");
        let request = mutation.request()?;

        let envelope = match self
            .transport
            .send(request)
            .await
            .and_then(Envelope::ensure_success)
        {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(mutation = mutation.name(), error = %e, "mutation failed");
                return Err(e);
            }
        };

        self.invalidate_tags(mutation.invalidates());
        Ok(envelope.message)
    }

    /// Mark every entry carrying one of `tags` stale and refetch it in the background.
    /// Returns the number of entries invalidated.
    pub fn invalidate_tags(&self, tags: &[Tag]) -> usize {
        let mut invalidated = 0;
        let started: Vec<(Notice, PendingFetch)> = {
            let mut state = self.lock();
            let mut started = Vec::new();
            for slot in state.slots.values_mut() {
                // A first fetch still in flight has no tags yet but will carry the declared ones.
                let pending_match = slot.in_flight.is_some()
                    && super::tags::intersects(slot.entry.query.provides(), tags);
                if !slot.entry.carries(tags) && !pending_match {
                    continue;
                }
                invalidated += 1;
                slot.entry.mark_stale();
                if slot.in_flight.is_some() {
                    // Whatever is in flight may predate the mutation.
                    slot.refetch_queued = true;
                } else {
                    let (_settled, notice, fetch) = self.start_fetch(slot);
                    started.push((notice, fetch));
                }
            }
            started
        };

        info!(?tags, invalidated, "invalidated tags");
        for (notice, fetch) in started {
            notice.deliver();
            fetch.spawn();
        }
        invalidated
    }

    /// Register a callback for every state transition of `query`'s entry.
    /// Does not fetch; pair with [`query`](Self::query).
    ///
    /// Callbacks run on whichever task caused the transition, one at a time per
    /// entry. They must not call back into the cache for the same entry.
    pub fn subscribe(
        &self,
        query: Query,
        callback: impl Fn(&CacheEntry) + Send + Sync + 'static,
    ) -> Subscription {
        let mut state = self.lock();
        state.next_subscription += 1;
        let id = state.next_subscription;

        let slot = state.slot(&query);
        slot.subscribers.push((id, Arc::new(callback)));
        slot.idle_since = None;

        debug!(%query, id, "subscribed");
        Subscription { query, id }
    }

    /// Remove a callback. In-flight work is unaffected and its result is still cached.
    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        let mut state = self.lock();
        let Some(slot) = state.slots.get_mut(&subscription.query) else {
            return false;
        };

        let before = slot.subscribers.len();
        slot.subscribers.retain(|(id, _)| *id != subscription.id);
        if slot.subscribers.is_empty() && slot.idle_since.is_none() {
            slot.idle_since = Some(Instant::now());
        }

        debug!(query = %subscription.query, id = subscription.id, "unsubscribed");
        before != slot.subscribers.len()
    }

    pub fn subscriber_count(&self, query: &Query) -> usize {
        self.lock()
            .slots
            .get(query)
            .map_or(0, |slot| slot.subscribers.len())
    }

    /// Current entry for `query`, without fetching.
    pub fn peek(&self, query: &Query) -> Option<CacheEntry> {
        self.lock().slots.get(query).map(|slot| slot.entry.clone())
    }

    /// Snapshot of every entry.
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.lock()
            .slots
            .values()
            .map(|slot| slot.entry.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Evict entries that have had no subscribers for the idle window and are not in flight.
    /// Returns the number of evicted entries.
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let keep_unused_for = self.keep_unused_for;
        let mut state = self.lock();
        let before = state.slots.len();

        state.slots.retain(|query, slot| {
            let expired = slot.subscribers.is_empty()
                && slot.in_flight.is_none()
                && slot
                    .idle_since
                    .is_some_and(|since| now.duration_since(since) >= keep_unused_for);
            if expired {
                debug!(%query, "evicting unused entry");
            }
            !expired
        });

        before - state.slots.len()
    }

    /// Drop the entry for `query` unless a fetch for it is in flight.
    /// Subscribers are dropped with it. Returns true if an entry was removed.
    pub fn evict(&self, query: &Query) -> bool {
        let mut state = self.lock();
        if state
            .slots
            .get(query)
            .is_some_and(|slot| slot.in_flight.is_some())
        {
            return false;
        }
        let removed = state.slots.remove(query).is_some();
        if removed {
            debug!(%query, "evicted");
        }
        removed
    }

    /// Move `slot` to loading. Called with the lock held; once it is released the
    /// notice is delivered first and the fetch spawned after, so the loading
    /// transition always reaches subscribers before the settled one.
    fn start_fetch(&self, slot: &mut Slot) -> (Settled, Notice, PendingFetch) {
        let (tx, rx) = watch::channel(None);
        slot.entry.begin_fetch();
        slot.in_flight = Some(rx.clone());

        let query = slot.entry.query.clone();
        debug!(%query, "fetching");

        let fetch = PendingFetch {
            cache: self.clone(),
            query,
            tx,
        };
        (rx, slot.notice(), fetch)
    }

    fn settle(
        &self,
        query: Query,
        result: Result<QueryData>,
        tx: watch::Sender<Option<CacheEntry>>,
    ) {
        let (settled, notice, queued) = {
            let mut state = self.lock();
            let slot = state.slot(&query);

            match result {
                Ok(data) => {
                    debug!(%query, "query fulfilled");
                    slot.entry.fulfill(data);
                }
                Err(e) => {
                    warn!(%query, error = %e, "query failed");
                    slot.entry.reject(e);
                }
            }
            slot.in_flight = None;

            let settled = slot.entry.clone();
            let notice = slot.notice();
            let queued = if slot.refetch_queued {
                slot.refetch_queued = false;
                slot.entry.mark_stale();
                let (_settled, notice, fetch) = self.start_fetch(slot);
                Some((notice, fetch))
            } else {
                None
            };
            (settled, notice, queued)
        };

        // Subscribers hear about the transition before waiting callers resume.
        notice.deliver();
        if let Some((notice, fetch)) = queued {
            notice.deliver();
            fetch.spawn();
        }
        tx.send_replace(Some(settled));
    }

    async fn wait_settled(&self, query: &Query, settled: &mut Settled) -> CacheEntry {
        let entry = match settled.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        // The sender only drops without a value if the fetch task panicked.
        entry
            .or_else(|| self.peek(query))
            .unwrap_or_else(|| CacheEntry::new(query.clone()))
    }
}
