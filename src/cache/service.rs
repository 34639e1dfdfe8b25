//! Loading Cache Service
//!
//! The caller-facing facade: a lazily built [`CacheStore`] behind the
//! get / fetch / put / del contract.

use std::fmt::Debug;
use std::hash::Hash;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::cache::{CacheStats, CacheStore, Loader};
use crate::config::CacheConfig;
use crate::error::{ConfigError, Result};

/// Status code for a successful `put` or a `del` that removed an entry.
pub const STATUS_OK: i32 = 1;
/// Status code for a `del` of an absent key, or a `put` the cache could not accept.
pub const STATUS_NOT_FOUND: i32 = -1;

// == Cache Service ==
/// get / fetch / put / del over a read-through cache.
#[async_trait]
pub trait CacheService<K, V>: Send + Sync {
    /// Returns the cached value, loading it if needed.
    async fn get(&self, key: &K) -> Result<V>;

    /// True if a live entry exists. Never loads.
    async fn fetch(&self, key: &K) -> bool;

    /// Stores a value. Returns [`STATUS_OK`].
    async fn put(&self, key: K, value: V) -> i32;

    /// Removes a value. Returns [`STATUS_OK`] if removed, [`STATUS_NOT_FOUND`] otherwise.
    async fn del(&self, key: &K) -> i32;
}

// == Loading Cache ==
/// A named read-through cache whose store is built on first use.
///
/// Construction is deferred to the first `get`/`put`, happens exactly once
/// however many callers race for it, and its outcome (including a
/// configuration error) is shared by every caller from then on.
pub struct LoadingCache<K, V> {
    name: String,
    config: CacheConfig,
    loader: Arc<dyn Loader<K, V>>,
    store: OnceLock<std::result::Result<CacheStore<K, V>, ConfigError>>,
}

impl<K, V> LoadingCache<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, config: CacheConfig, loader: impl Loader<K, V>) -> Self {
        Self {
            name: name.into(),
            config,
            loader: Arc::new(loader),
            store: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // == Store ==
    /// Returns the store, building it on first call.
    pub fn store(&self) -> Result<&CacheStore<K, V>> {
        let store = self.store.get_or_init(|| {
            let built = CacheStore::new(self.config.clone(), Arc::clone(&self.loader));
            match &built {
                Ok(_) => info!(cache = %self.name, "Local cache initialized"),
                Err(err) => warn!(cache = %self.name, error = %err, "Local cache failed to initialize"),
            }
            built
        });
        store.as_ref().map_err(|err| err.clone().into())
    }

    /// The store if it has been built successfully, without building it.
    pub fn initialized(&self) -> Option<&CacheStore<K, V>> {
        self.store.get().and_then(|store| store.as_ref().ok())
    }

    /// Current statistics. Builds the store if needed.
    pub async fn stats(&self) -> Result<CacheStats> {
        Ok(self.store()?.stats().await)
    }

    /// When the cache was initialized, if it has been.
    pub fn reset_time(&self) -> Option<DateTime<Utc>> {
        self.initialized()
            .map(|store| store.stats_tracker().reset_time())
    }

    /// When the cache last reached a new size high, if it has been initialized.
    pub fn highest_time(&self) -> Option<DateTime<Utc>> {
        self.initialized()
            .map(|store| store.stats_tracker().highest_time())
    }

    pub fn highest_size(&self) -> usize {
        self.initialized()
            .map_or(0, |store| store.stats_tracker().highest_size())
    }

    /// Purges expired entries. A cache that was never used has nothing to purge.
    pub async fn cleanup_expired(&self) -> usize {
        match self.initialized() {
            Some(store) => store.cleanup_expired().await,
            None => 0,
        }
    }

    pub async fn len(&self) -> usize {
        match self.initialized() {
            Some(store) => store.len().await,
            None => 0,
        }
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl<K, V> CacheService<K, V> for LoadingCache<K, V>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Result<V> {
        self.store()?.get(key).await
    }

    async fn fetch(&self, key: &K) -> bool {
        match self.initialized() {
            Some(store) => store.probe(key).await,
            None => false,
        }
    }

    async fn put(&self, key: K, value: V) -> i32 {
        match self.store() {
            Ok(store) => {
                store.put(key, value).await;
                STATUS_OK
            }
            Err(err) => {
                warn!(cache = %self.name, error = %err, "Put rejected");
                STATUS_NOT_FOUND
            }
        }
    }

    async fn del(&self, key: &K) -> i32 {
        match self.initialized() {
            Some(store) if store.invalidate(key).await => STATUS_OK,
            _ => STATUS_NOT_FOUND,
        }
    }
}
