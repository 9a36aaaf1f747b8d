//! Keyed query cache over a remote fetcher.
//!
//! Each key owns one entry holding its last good value, its last error
//! and at most one in-flight fetch. Concurrent requests for a key join
//! the in-flight fetch instead of issuing their own. Every started fetch
//! gets a generation from one cache-wide counter; a result is applied
//! only if its fetch is still the one its entry is waiting on, so
//! responses are keyed and ordered by initiation, never by arrival. A
//! fetch started before its entry was removed never matches the entry
//! that replaces it.
//!
//! Fetches run on spawned tasks, so a caller that stops waiting does not
//! cancel the request; its result still lands in the cache.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use futures_util::future::{join_all, BoxFuture, FutureExt, Shared};
use notehub_core::{FetchError, QueryPrefix};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::CacheConfig;
use crate::snapshot::{CacheRead, QuerySnapshot, QueryStatus};
use crate::traits::{CacheKey, CacheStats, QueryFetcher};

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, FetchError>>>;

struct InFlight<V> {
    generation: u64,
    future: SharedFetch<V>,
}

struct Entry<V> {
    status: QueryStatus,
    data: Option<V>,
    data_updated_at: Option<Instant>,
    error: Option<FetchError>,
    error_updated_at: Option<Instant>,
    invalidated: bool,
    in_flight: Option<InFlight<V>>,
    observers: usize,
    last_requested: Instant,
}

impl<V> Entry<V> {
    fn new(now: Instant) -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            data_updated_at: None,
            error: None,
            error_updated_at: None,
            invalidated: false,
            in_flight: None,
            observers: 0,
            last_requested: now,
        }
    }

    fn is_stale(&self, now: Instant, stale_time: Duration) -> bool {
        if self.invalidated {
            return true;
        }
        match self.data_updated_at {
            Some(updated) => now.saturating_duration_since(updated) >= stale_time,
            None => true,
        }
    }
}

struct State<K, V> {
    entries: HashMap<K, Entry<V>>,
    stats: CacheStats,
    /// Last generation handed out, across all entries.
    generation: u64,
}

struct Inner<K, V> {
    fetcher: Arc<dyn QueryFetcher<K, V>>,
    config: CacheConfig,
    state: Mutex<State<K, V>>,
}

impl<K, V> Inner<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    fn lock(&self) -> MutexGuard<'_, State<K, V>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn fetch_with_retry(&self, key: &K) -> Result<V, FetchError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            self.lock().stats.fetches += 1;
            match self.fetcher.fetch(key).await {
                Ok(value) => return Ok(value),
                Err(err) if attempts <= self.config.retry => {
                    tracing::warn!(key = %key, attempt = attempts, error = %err, "Fetch failed, retrying");
                    self.lock().stats.retries += 1;
                    tokio::time::sleep(self.config.retry_delay).await;
                }
                Err(err) => return Err(FetchError::new(key.to_string(), attempts, err)),
            }
        }
    }

    /// Apply a settled fetch to its entry unless a newer one superseded it.
    fn settle(&self, key: &K, generation: u64, result: &Result<V, FetchError>) {
        let mut state = self.lock();
        let State { entries, stats, .. } = &mut *state;
        let Some(entry) = entries.get_mut(key) else {
            stats.discarded += 1;
            tracing::debug!(key = %key, generation, "Entry evicted before fetch settled");
            return;
        };
        let current = entry.in_flight.as_ref().map(|in_flight| in_flight.generation);
        if current != Some(generation) {
            stats.discarded += 1;
            tracing::debug!(
                key = %key,
                generation,
                current = ?current,
                "Discarding superseded fetch result"
            );
            return;
        }

        entry.in_flight = None;
        match result {
            Ok(value) => {
                entry.data = Some(value.clone());
                entry.data_updated_at = Some(Instant::now());
                entry.error = None;
                entry.invalidated = false;
                entry.status = QueryStatus::Success;
                tracing::debug!(key = %key, generation, "Fetch succeeded");
            }
            Err(err) => {
                entry.error = Some(err.clone());
                entry.error_updated_at = Some(Instant::now());
                entry.status = QueryStatus::Error;
                tracing::warn!(key = %key, generation, attempts = err.attempts, error = %err, "Fetch failed");
            }
        }
    }
}

/// Keyed, time-bounded cache of query results.
///
/// Cheap to clone; clones share the same entries. Must be used from
/// within a tokio runtime because fetches are spawned.
pub struct QueryCache<K, V> {
    inner: Arc<Inner<K, V>>,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V> QueryCache<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    /// Create a new cache.
    pub fn new(fetcher: Arc<dyn QueryFetcher<K, V>>, config: CacheConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                config,
                state: Mutex::new(State {
                    entries: HashMap::new(),
                    stats: CacheStats::default(),
                    generation: 0,
                }),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Join the in-flight fetch for `key`, or start one.
    ///
    /// With `force`, a new generation is always started; the older
    /// in-flight fetch keeps running but its result will be discarded.
    fn begin(&self, key: &K, force: bool) -> SharedFetch<V> {
        let now = Instant::now();
        let mut state = self.inner.lock();
        let State {
            entries,
            stats,
            generation: last_generation,
        } = &mut *state;
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(now));
        entry.last_requested = now;

        if !force {
            if let Some(in_flight) = &entry.in_flight {
                stats.deduplicated += 1;
                tracing::trace!(key = %key, generation = in_flight.generation, "Joining in-flight fetch");
                return in_flight.future.clone();
            }
        }

        *last_generation += 1;
        let generation = *last_generation;
        entry.status = QueryStatus::Loading;

        let inner = Arc::clone(&self.inner);
        let task_key = key.clone();
        let future = async move {
            let result = inner.fetch_with_retry(&task_key).await;
            inner.settle(&task_key, generation, &result);
            result
        }
        .boxed()
        .shared();

        entry.in_flight = Some(InFlight {
            generation,
            future: future.clone(),
        });
        drop(state);

        tracing::debug!(key = %key, generation, force, "Starting fetch");
        tokio::spawn(future.clone());
        future
    }

    /// Read `key`, fetching on miss.
    ///
    /// Fresh data is returned as is. Stale data is returned immediately
    /// and a background refresh is started (stale-while-revalidate). With
    /// no data the caller waits for the fetch, joining one already in
    /// flight.
    pub async fn get(&self, key: &K) -> Result<CacheRead<V>, FetchError> {
        let now = Instant::now();
        let cached = {
            let mut state = self.inner.lock();
            let stale_time = self.inner.config.stale_time;
            let State { entries, stats, .. } = &mut *state;
            match entries.get_mut(key) {
                Some(entry) => {
                    entry.last_requested = now;
                    match &entry.data {
                        Some(data) => {
                            stats.hits += 1;
                            Some((data.clone(), entry.is_stale(now, stale_time)))
                        }
                        None => None,
                    }
                }
                None => None,
            }
        };

        match cached {
            Some((value, false)) => Ok(CacheRead::from_cache(value)),
            Some((value, true)) => {
                self.begin(key, false);
                Ok(CacheRead::stale(value))
            }
            None => {
                self.inner.lock().stats.misses += 1;
                let value = self.begin(key, false).await?;
                Ok(CacheRead::from_fetch(value))
            }
        }
    }

    /// Fetch `key`, joining an in-flight fetch if there is one.
    pub async fn fetch(&self, key: &K) -> Result<V, FetchError> {
        self.begin(key, false).await
    }

    /// Force a new fetch for `key`, superseding any in-flight one.
    pub async fn refetch(&self, key: &K) -> Result<V, FetchError> {
        self.begin(key, true).await
    }

    /// Wait for the fetch currently in flight for `key`, if any.
    pub async fn wait(&self, key: &K) -> Option<Result<V, FetchError>> {
        let in_flight = self
            .inner
            .lock()
            .entries
            .get(key)
            .and_then(|entry| entry.in_flight.as_ref().map(|f| f.future.clone()));
        match in_flight {
            Some(future) => Some(future.await),
            None => None,
        }
    }

    /// Start a background fetch if `key` has no fresh data and none is in
    /// flight. Returns whether a fetch was started. Never waits.
    pub fn ensure(&self, key: &K) -> bool {
        let now = Instant::now();
        {
            let mut state = self.inner.lock();
            let stale_time = self.inner.config.stale_time;
            if let Some(entry) = state.entries.get_mut(key) {
                entry.last_requested = now;
                if entry.in_flight.is_some() || !entry.is_stale(now, stale_time) {
                    return false;
                }
            }
        }
        self.begin(key, false);
        true
    }

    /// Current state of `key`. Unknown keys are `Idle`.
    pub fn snapshot(&self, key: &K) -> QuerySnapshot<V> {
        let state = self.inner.lock();
        match state.entries.get(key) {
            Some(entry) => QuerySnapshot {
                status: entry.status,
                data: entry.data.clone(),
                error: entry.error.clone(),
                is_fetching: entry.in_flight.is_some(),
                is_invalidated: entry.invalidated,
                data_updated_at: entry.data_updated_at,
                error_updated_at: entry.error_updated_at,
            },
            None => QuerySnapshot::idle(),
        }
    }

    /// Register interest in `key`. Observed keys are refetched by
    /// [`QueryCache::invalidate`] and are never garbage collected.
    pub fn observe(&self, key: &K) -> Subscription<K, V> {
        let now = Instant::now();
        {
            let mut state = self.inner.lock();
            let entry = state
                .entries
                .entry(key.clone())
                .or_insert_with(|| Entry::new(now));
            entry.observers += 1;
            entry.last_requested = now;
        }
        Subscription {
            inner: Arc::downgrade(&self.inner),
            key: key.clone(),
        }
    }

    /// Keys that currently have at least one observer.
    pub fn observed_keys(&self) -> Vec<K> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|(_, entry)| entry.observers > 0)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Mark every entry under `prefix` stale and refetch the observed ones.
    ///
    /// Waits for those refetches to settle. Their errors are recorded on
    /// the entries, not returned. Returns the number of entries marked.
    pub async fn invalidate(&self, prefix: &QueryPrefix) -> usize {
        let (marked, active) = {
            let mut state = self.inner.lock();
            let mut marked = 0;
            let mut active = Vec::new();
            for (key, entry) in state.entries.iter_mut() {
                if !key.matches(prefix) {
                    continue;
                }
                entry.invalidated = true;
                marked += 1;
                if entry.observers > 0 {
                    active.push(key.clone());
                }
            }
            (marked, active)
        };

        tracing::info!(prefix = %prefix, marked, refetching = active.len(), "Invalidated queries");

        let refetches: Vec<_> = active.iter().map(|key| self.begin(key, true)).collect();
        join_all(refetches).await;
        marked
    }

    /// Evict unobserved, idle entries whose last request is older than
    /// `gc_time`. Returns the number evicted.
    pub fn collect_garbage(&self) -> usize {
        let now = Instant::now();
        let gc_time = self.inner.config.gc_time;
        let mut state = self.inner.lock();
        let before = state.entries.len();
        state.entries.retain(|_, entry| {
            entry.observers > 0
                || entry.in_flight.is_some()
                || now.saturating_duration_since(entry.last_requested) < gc_time
        });
        let evicted = before - state.entries.len();
        state.stats.evictions += evicted as u64;
        if evicted > 0 {
            tracing::debug!(evicted, remaining = state.entries.len(), "Collected idle queries");
        }
        evicted
    }

    /// Run [`QueryCache::collect_garbage`] every `interval` until the cache
    /// is dropped.
    pub fn spawn_gc(&self, interval: Duration) -> JoinHandle<()> {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                QueryCache { inner }.collect_garbage();
            }
        })
    }

    /// Drop every entry. In-flight results will be discarded.
    pub fn clear(&self) {
        let mut state = self.inner.lock();
        let count = state.entries.len();
        state.entries.clear();
        tracing::debug!(count, "Cleared query cache");
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }
}

/// Keeps a key observed while alive.
///
/// Dropping the last subscription for a key starts its gc clock.
pub struct Subscription<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    inner: Weak<Inner<K, V>>,
    key: K,
}

impl<K, V> Subscription<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    pub fn key(&self) -> &K {
        &self.key
    }
}

impl<K, V> Drop for Subscription<K, V>
where
    K: CacheKey,
    V: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        let mut state = inner.lock();
        if let Some(entry) = state.entries.get_mut(&self.key) {
            entry.observers = entry.observers.saturating_sub(1);
            entry.last_requested = Instant::now();
        }
    }
}

impl<K, V> std::fmt::Debug for Subscription<K, V>
where
    K: CacheKey + std::fmt::Debug,
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("key", &self.key).finish()
    }
}
