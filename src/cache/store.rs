//! Cache Store Module
//!
//! Main cache engine: a HashMap of entries with LRU eviction, write-age
//! expiry, read-through loading and refresh-ahead reloads.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cache::{CacheEntry, CacheStats, Freshness, Loader, LruTracker, StatsTracker};
use crate::config::CacheConfig;
use crate::error::{CacheError, ConfigError, Result};
use crate::tasks::{RefreshExecutor, RefreshJob};

/// Per-key gate that serializes first fills of one key.
type LoadGate = Arc<Mutex<()>>;

// == Store State ==
/// Everything guarded by the entry lock.
struct StoreState<K, V> {
    entries: HashMap<K, CacheEntry<V>>,
    lru: LruTracker<K>,
    next_generation: u64,
}

impl<K: Hash + Eq + Clone + Debug, V> StoreState<K, V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            next_generation: 0,
        }
    }

    // == Insert ==
    /// Writes an entry, evicting the least recently used key when a new key
    /// would push the store past `maximum_size`.
    fn insert(&mut self, key: K, value: V, maximum_size: usize, stats: &StatsTracker) {
        if !self.entries.contains_key(&key) && self.entries.len() >= maximum_size {
            if let Some(evicted) = self.lru.evict_oldest() {
                self.entries.remove(&evicted);
                stats.record_eviction();
                debug!(key = ?evicted, "Evicted least recently used entry");
            }
        }

        self.next_generation += 1;
        self.lru.touch(&key);
        let entry = CacheEntry::new(value, self.next_generation);
        self.entries.insert(key, entry);
        stats.observe(self.entries.len());
    }

    fn remove(&mut self, key: &K) -> Option<CacheEntry<V>> {
        self.lru.remove(key);
        self.entries.remove(key)
    }
}

// == Shared ==
/// State shared between the store handle and in-flight refresh tasks.
///
/// `refreshing` and `loading` sit behind plain mutexes so guards can release
/// them from `Drop`. When both are needed, `state` is taken first.
struct Shared<K, V> {
    state: RwLock<StoreState<K, V>>,
    /// Keys with a refresh queued or running
    refreshing: std::sync::Mutex<HashSet<K>>,
    /// Keys with a synchronous load in progress
    loading: std::sync::Mutex<HashMap<K, LoadGate>>,
    loader: Arc<dyn Loader<K, V>>,
    stats: StatsTracker,
    config: CacheConfig,
}

impl<K, V> Shared<K, V> {
    fn refreshing(&self) -> MutexGuard<'_, HashSet<K>> {
        self.refreshing.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn loading(&self) -> MutexGuard<'_, HashMap<K, LoadGate>> {
        self.loading.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// == Load Gate Guard ==
/// A caller's hold on the load gate of one key.
///
/// Dropping it unregisters the gate if it is still the current one, whether
/// the load finished, found the value already filled, or was cancelled.
struct GateGuard<'a, K: Hash + Eq, V> {
    shared: &'a Shared<K, V>,
    key: K,
    gate: LoadGate,
}

impl<'a, K: Hash + Eq + Clone, V> GateGuard<'a, K, V> {
    fn join(shared: &'a Shared<K, V>, key: &K) -> Self {
        let gate = Arc::clone(shared.loading().entry(key.clone()).or_default());
        Self {
            shared,
            key: key.clone(),
            gate,
        }
    }
}

impl<K: Hash + Eq, V> Drop for GateGuard<'_, K, V> {
    fn drop(&mut self) {
        let mut loading = self.shared.loading();
        if loading
            .get(&self.key)
            .is_some_and(|current| Arc::ptr_eq(current, &self.gate))
        {
            loading.remove(&self.key);
        }
    }
}

// == Refresh Task ==
/// One background reload of a stale key.
///
/// `generation` identifies the entry that went stale. The reloaded value only
/// replaces that exact entry; if the key was rewritten, reloaded or removed
/// meanwhile, the result is discarded.
///
/// The task owns the key's in-flight marker: however it ends (finished,
/// rejected by a full queue, or dropped with a cancelled submitter) the
/// marker is cleared when the task is dropped.
struct RefreshTask<K: Hash + Eq, V> {
    key: K,
    generation: u64,
    shared: Arc<Shared<K, V>>,
}

impl<K: Hash + Eq, V> Drop for RefreshTask<K, V> {
    fn drop(&mut self) {
        self.shared.refreshing().remove(&self.key);
    }
}

impl<K, V> RefreshTask<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn run(self) {
        let key = &self.key;
        let shared = &self.shared;
        let result = shared.loader.load(key).await;

        let mut state = shared.state.write().await;
        match result {
            Ok(value) => {
                let current = state.entries.get(key).map(|entry| entry.generation);
                if current == Some(self.generation) {
                    let maximum_size = shared.config.maximum_size;
                    state.insert(key.clone(), value, maximum_size, &shared.stats);
                    shared.stats.record_refresh_success();
                    debug!(key = ?key, "Refreshed entry");
                } else {
                    debug!(key = ?key, "Entry changed during refresh, discarding reloaded value");
                }
            }
            Err(source) => {
                shared.stats.record_refresh_failure();
                let err = CacheError::Refresh {
                    key: format!("{:?}", key),
                    source,
                };
                warn!(error = %err, "Refresh failed, keeping stale entry");
            }
        }
    }
}

// == Cache Store ==
/// Read-through cache storage with LRU eviction, expiry and refresh-ahead.
///
/// Entry state sits behind one `RwLock` that is never held across a loader
/// call or a refresh submission.
pub struct CacheStore<K, V> {
    shared: Arc<Shared<K, V>>,
    refresher: RefreshExecutor,
}

impl<K, V> CacheStore<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Validates `config` and builds an empty store whose refresh workers run
    /// on the current tokio runtime.
    pub fn new(
        config: CacheConfig,
        loader: Arc<dyn Loader<K, V>>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        let handle = Handle::try_current().map_err(|_| ConfigError::RuntimeUnavailable)?;

        if !config.refresh_enabled() {
            warn!(
                refresh_after_write = ?config.refresh_after_write,
                expire_after_write = ?config.expire_after_write,
                "Refresh threshold is not below expiry threshold, entries will expire before they refresh"
            );
        }

        let refresher = RefreshExecutor::spawn(
            &handle,
            config.refresh_workers,
            config.refresh_queue_capacity,
            config.saturation_policy,
        );

        Ok(Self {
            shared: Arc::new(Shared {
                state: RwLock::new(StoreState::new()),
                refreshing: std::sync::Mutex::new(HashSet::new()),
                loading: std::sync::Mutex::new(HashMap::new()),
                loader,
                stats: StatsTracker::new(),
                config,
            }),
            refresher,
        })
    }

    // == Get ==
    /// Returns the value for `key`, loading it when absent or expired.
    ///
    /// A stale value is returned as-is and a single background refresh is
    /// scheduled for the key. Loader failures are returned as
    /// [`CacheError::Load`] and leave nothing cached.
    pub async fn get(&self, key: &K) -> Result<V> {
        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }
        self.load(key).await
    }

    /// Serves a live entry, scheduling a refresh when it is stale.
    async fn lookup(&self, key: &K) -> Option<V> {
        let shared = &self.shared;
        let (value, stale_generation) = {
            let mut state = shared.state.write().await;
            let freshness = state.entries.get(key)?.freshness(&shared.config);

            if freshness == Freshness::Expired {
                state.remove(key);
                debug!(key = ?key, "Entry expired");
                return None;
            }

            let entry = &state.entries[key];
            let value = entry.value.clone();
            let generation = entry.generation;
            state.lru.touch(key);
            shared.stats.record_hit();
            shared.stats.observe(state.entries.len());

            let schedule =
                freshness == Freshness::Stale && shared.refreshing().insert(key.clone());
            (value, schedule.then_some(generation))
        };

        if let Some(generation) = stale_generation {
            self.schedule_refresh(key.clone(), generation).await;
        }
        Some(value)
    }

    /// Fills a missing key. Concurrent callers for the same key queue on one
    /// gate; whoever gets it first loads, the rest find the stored value.
    async fn load(&self, key: &K) -> Result<V> {
        let shared = &self.shared;
        let gate = GateGuard::join(&**shared, key);
        let _permit = gate.gate.lock().await;

        if let Some(value) = self.lookup(key).await {
            return Ok(value);
        }

        shared.stats.record_miss();
        let result = shared.loader.load(key).await;

        let mut state = shared.state.write().await;
        match result {
            Ok(value) => {
                let maximum_size = shared.config.maximum_size;
                state.insert(key.clone(), value.clone(), maximum_size, &shared.stats);
                shared.stats.record_load_success();
                debug!(key = ?key, "Loaded entry");
                Ok(value)
            }
            Err(source) => {
                shared.stats.record_load_failure();
                warn!(key = ?key, error = %source, "Load failed");
                Err(CacheError::Load {
                    key: format!("{:?}", key),
                    source,
                })
            }
        }
    }

    async fn schedule_refresh(&self, key: K, generation: u64) {
        let task = RefreshTask {
            key: key.clone(),
            generation,
            shared: Arc::clone(&self.shared),
        };
        let job: RefreshJob = Box::pin(task.run());

        // A rejected or cancelled job is dropped, which clears the key's marker
        if self.refresher.submit(job).await {
            debug!(key = ?key, "Scheduled refresh");
        } else {
            self.shared.stats.record_refresh_dropped();
        }
    }

    // == Probe ==
    /// True if `key` holds a live entry. Never loads, refreshes or touches LRU order.
    pub async fn probe(&self, key: &K) -> bool {
        let state = self.shared.state.read().await;
        state
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(self.shared.config.expire_after_write))
    }

    // == Put ==
    /// Stores `value` under `key` as a fresh write.
    pub async fn put(&self, key: K, value: V) {
        let shared = &self.shared;
        let mut state = shared.state.write().await;
        state.insert(key, value, shared.config.maximum_size, &shared.stats);
    }

    // == Invalidate ==
    /// Removes `key`. Returns true only when a live entry was removed; an
    /// expired leftover is discarded and reported as absent.
    pub async fn invalidate(&self, key: &K) -> bool {
        let mut state = self.shared.state.write().await;
        match state.remove(key) {
            Some(entry) => !entry.is_expired(self.shared.config.expire_after_write),
            None => false,
        }
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let expire_after_write = self.shared.config.expire_after_write;
        let mut state = self.shared.state.write().await;

        let expired_keys: Vec<K> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(expire_after_write))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            state.remove(key);
        }
        expired_keys.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> CacheStats {
        let len = self.len().await;
        self.shared.stats.snapshot(len)
    }

    pub fn stats_tracker(&self) -> &StatsTracker {
        &self.shared.stats
    }

    pub fn config(&self) -> &CacheConfig {
        &self.shared.config
    }

    /// Returns the current number of entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.shared.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::test_support::{wait_for, ScriptedLoader};
    use crate::config::SaturationPolicy;
    use std::time::Duration;
    use tokio::time::{advance, timeout};

    const REFRESH: Duration = Duration::from_secs(30 * 60);
    const EXPIRE: Duration = Duration::from_secs(60 * 60);

    fn config(maximum_size: usize) -> CacheConfig {
        CacheConfig::default()
            .with_maximum_size(maximum_size)
            .with_refresh_after_write(REFRESH)
            .with_expire_after_write(EXPIRE)
    }

    fn store(maximum_size: usize, loader: &ScriptedLoader) -> CacheStore<String, String> {
        CacheStore::new(config(maximum_size), Arc::new(loader.clone())).unwrap()
    }

    fn key(k: &str) -> String {
        k.to_string()
    }

    /// One refresh worker and room for one queued refresh.
    fn saturating_store(
        policy: SaturationPolicy,
        loader: &ScriptedLoader,
    ) -> CacheStore<String, String> {
        let config = config(10)
            .with_refresh_workers(1)
            .with_refresh_queue_capacity(1)
            .with_saturation_policy(policy);
        CacheStore::new(config, Arc::new(loader.clone())).unwrap()
    }

    /// Puts `a`, `b` and `c`, lets them go stale, then parks a refresh of `a`
    /// on the worker and queues a refresh of `b`.
    async fn fill_refresh_queue(store: &CacheStore<String, String>, loader: &ScriptedLoader) {
        for k in ["a", "b", "c"] {
            store.put(key(k), k.to_string()).await;
        }
        loader.set_value("2");
        loader.pause();
        advance(REFRESH).await;

        assert_eq!(store.get(&key("a")).await.unwrap(), "a");
        wait_for(|| loader.calls() == 1).await;
        assert_eq!(store.get(&key("b")).await.unwrap(), "b");
    }

    fn refresh_successes(store: &CacheStore<String, String>) -> u64 {
        store.stats_tracker().snapshot(0).refresh_successes
    }

    #[tokio::test(start_paused = true)]
    async fn test_miss_loads_once() {
        let loader = ScriptedLoader::new("1");
        let store = store(100, &loader);

        assert_eq!(store.get(&key("x")).await.unwrap(), "1");
        assert_eq!(loader.calls(), 1);

        // Fresh hit does not call the loader again
        assert_eq!(store.get(&key("x")).await.unwrap(), "1");
        assert_eq!(loader.calls(), 1);

        let stats = store.stats().await;
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.load_successes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_read_serves_old_value_and_refreshes() {
        let loader = ScriptedLoader::new("1");
        let store = store(100, &loader);

        assert_eq!(store.get(&key("x")).await.unwrap(), "1");

        loader.set_value("2");
        loader.pause();
        advance(REFRESH).await;

        // Stale: old value served, one refresh scheduled
        assert_eq!(store.get(&key("x")).await.unwrap(), "1");
        wait_for(|| loader.calls() == 2).await;

        // A second stale read while the refresh is in flight schedules nothing
        assert_eq!(store.get(&key("x")).await.unwrap(), "1");
        tokio::task::yield_now().await;
        assert_eq!(loader.calls(), 2);

        loader.resume();
        wait_for(|| store.stats_tracker().snapshot(0).refresh_successes == 1).await;

        assert_eq!(store.get(&key("x")).await.unwrap(), "2");
        assert_eq!(loader.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_reloaded_synchronously() {
        let loader = ScriptedLoader::new("1");
        let store = store(100, &loader);

        store.get(&key("x")).await.unwrap();
        loader.set_value("2");
        advance(EXPIRE).await;

        assert_eq!(store.get(&key("x")).await.unwrap(), "2");
        assert_eq!(loader.calls(), 2);
        assert_eq!(store.stats().await.misses, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_failure_is_not_cached() {
        let loader = ScriptedLoader::new("1");
        let store = store(100, &loader);

        loader.fail(true);
        let err = store.get(&key("x")).await.unwrap_err();
        assert!(matches!(err, CacheError::Load { .. }));
        assert!(!store.probe(&key("x")).await);
        assert!(store.is_empty().await);

        loader.fail(false);
        assert_eq!(store.get(&key("x")).await.unwrap(), "1");
        assert_eq!(loader.calls(), 2);

        let stats = store.stats().await;
        assert_eq!(stats.load_failures, 1);
        assert_eq!(stats.load_successes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_failure_keeps_stale_entry() {
        let loader = ScriptedLoader::new("1");
        let store = store(100, &loader);

        store.get(&key("x")).await.unwrap();
        loader.fail(true);
        advance(REFRESH).await;

        assert_eq!(store.get(&key("x")).await.unwrap(), "1");
        wait_for(|| store.stats_tracker().snapshot(0).refresh_failures == 1).await;

        // Stale entry still served until it expires
        assert!(store.probe(&key("x")).await);
        assert_eq!(store.get(&key("x")).await.unwrap(), "1");

        advance(EXPIRE - REFRESH).await;
        assert!(!store.probe(&key("x")).await);
        assert!(store.get(&key("x")).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_put_during_refresh_wins() {
        let loader = ScriptedLoader::new("1");
        let store = store(100, &loader);

        store.get(&key("x")).await.unwrap();
        loader.set_value("reloaded");
        loader.pause();
        advance(REFRESH).await;

        store.get(&key("x")).await.unwrap();
        wait_for(|| loader.calls() == 2).await;

        store.put(key("x"), "explicit".to_string()).await;
        loader.resume();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(store.get(&key("x")).await.unwrap(), "explicit");
        assert_eq!(store.stats().await.refresh_successes, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_size_eviction_keeps_most_recent() {
        let loader = ScriptedLoader::new("v");
        let store = store(2, &loader);

        store.put(key("A"), "a".to_string()).await;
        store.put(key("B"), "b".to_string()).await;
        store.put(key("C"), "c".to_string()).await;

        assert_eq!(store.len().await, 2);
        assert!(!store.probe(&key("A")).await);
        assert!(store.probe(&key("B")).await);
        assert!(store.probe(&key("C")).await);
        assert_eq!(store.stats().await.evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_hit_protects_from_eviction() {
        let loader = ScriptedLoader::new("v");
        let store = store(2, &loader);

        store.put(key("A"), "a".to_string()).await;
        store.put(key("B"), "b".to_string()).await;
        store.get(&key("A")).await.unwrap();
        store.put(key("C"), "c".to_string()).await;

        assert!(store.probe(&key("A")).await);
        assert!(!store.probe(&key("B")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_does_not_touch_lru() {
        let loader = ScriptedLoader::new("v");
        let store = store(2, &loader);

        store.put(key("A"), "a".to_string()).await;
        store.put(key("B"), "b".to_string()).await;
        assert!(store.probe(&key("A")).await);
        store.put(key("C"), "c".to_string()).await;

        assert!(!store.probe(&key("A")).await);
        assert_eq!(loader.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate() {
        let loader = ScriptedLoader::new("v");
        let store = store(10, &loader);

        store.put(key("A"), "a".to_string()).await;
        assert!(store.invalidate(&key("A")).await);
        assert!(!store.invalidate(&key("A")).await);
        assert!(!store.probe(&key("A")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_expired_reports_absent() {
        let loader = ScriptedLoader::new("v");
        let store = store(10, &loader);

        store.put(key("A"), "a".to_string()).await;
        advance(EXPIRE).await;

        assert!(!store.invalidate(&key("A")).await);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_expired() {
        let loader = ScriptedLoader::new("v");
        let store = store(10, &loader);

        store.put(key("old"), "a".to_string()).await;
        advance(EXPIRE - Duration::from_secs(1)).await;
        store.put(key("new"), "b".to_string()).await;
        advance(Duration::from_secs(1)).await;

        assert_eq!(store.cleanup_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.probe(&key("new")).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_highest_size_survives_removals() {
        let loader = ScriptedLoader::new("v");
        let store = store(10, &loader);

        for k in ["a", "b", "c"] {
            store.put(key(k), k.to_string()).await;
        }
        store.invalidate(&key("a")).await;
        store.invalidate(&key("b")).await;

        let stats = store.stats().await;
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.highest_size, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_misses_load_once() {
        let loader = ScriptedLoader::new("1").with_delay(Duration::from_millis(50));
        let store = Arc::new(store(10, &loader));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.get(&key("k")).await.unwrap() })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), "1");
        }
        assert_eq!(loader.calls(), 1);
        assert!(store.shared.loading().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_loads_release_their_gates() {
        let loader = ScriptedLoader::new("v");
        let store = store(100, &loader);
        loader.pause();

        for i in 0..50 {
            let key = format!("k{}", i);
            let result = timeout(Duration::from_millis(1), store.get(&key)).await;
            assert!(result.is_err());
        }
        assert!(store.shared.loading().is_empty());

        loader.resume();
        assert_eq!(store.get(&key("k0")).await.unwrap(), "v");
        assert!(store.shared.loading().is_empty());
        assert!(!store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_policy_skips_refresh_and_retries_later() {
        let loader = ScriptedLoader::new("1");
        let store = saturating_store(SaturationPolicy::Drop, &loader);
        fill_refresh_queue(&store, &loader).await;

        // Queue is full: the refresh of `c` is dropped and the key re-armed
        assert_eq!(store.get(&key("c")).await.unwrap(), "c");
        assert_eq!(store.stats().await.refreshes_dropped, 1);
        assert!(!store.shared.refreshing().contains(&key("c")));

        loader.resume();
        wait_for(|| refresh_successes(&store) == 2).await;

        // The next stale read schedules the refresh that was skipped
        assert_eq!(store.get(&key("c")).await.unwrap(), "c");
        wait_for(|| refresh_successes(&store) == 3).await;
        assert_eq!(store.get(&key("c")).await.unwrap(), "2");
        assert_eq!(loader.calls(), 3);
        assert_eq!(store.stats().await.refreshes_dropped, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_policy_holds_reader_until_queue_has_room() {
        let loader = ScriptedLoader::new("1");
        let store = Arc::new(saturating_store(SaturationPolicy::Wait, &loader));
        fill_refresh_queue(&store, &loader).await;

        let reader = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.get(&key("c")).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!reader.is_finished());

        loader.resume();
        assert_eq!(reader.await.unwrap().unwrap(), "c");
        wait_for(|| refresh_successes(&store) == 3).await;

        assert_eq!(store.get(&key("c")).await.unwrap(), "2");
        assert_eq!(store.stats().await.refreshes_dropped, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_wait_submit_rearms_refresh() {
        let loader = ScriptedLoader::new("1");
        let store = saturating_store(SaturationPolicy::Wait, &loader);
        fill_refresh_queue(&store, &loader).await;

        // The reader gives up while waiting for queue capacity
        let result = timeout(Duration::from_millis(5), store.get(&key("c"))).await;
        assert!(result.is_err());
        assert!(!store.shared.refreshing().contains(&key("c")));

        loader.resume();
        wait_for(|| refresh_successes(&store) == 2).await;
        assert_eq!(loader.calls(), 2);

        assert_eq!(store.get(&key("c")).await.unwrap(), "c");
        wait_for(|| refresh_successes(&store) == 3).await;
        assert_eq!(loader.calls(), 3);
        assert_eq!(store.get(&key("c")).await.unwrap(), "2");
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let loader = ScriptedLoader::new("v");
        let result: std::result::Result<CacheStore<String, String>, _> =
            CacheStore::new(config(0), Arc::new(loader));
        assert!(matches!(result, Err(ConfigError::InvalidMaximumSize)));
    }

    #[test]
    fn test_new_outside_runtime_fails() {
        let loader = ScriptedLoader::new("v");
        let result: std::result::Result<CacheStore<String, String>, _> =
            CacheStore::new(config(10), Arc::new(loader));
        assert!(matches!(result, Err(ConfigError::RuntimeUnavailable)));
    }
}
