//! Cache Entry Module
//!
//! Defines the structure for individual cache entries and how their age
//! maps onto the refresh and expiry thresholds.

use std::time::Duration;

use tokio::time::Instant;

use crate::config::CacheConfig;

// == Freshness ==
/// Where an entry sits relative to the configured thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Younger than `refresh_after_write`
    Fresh,
    /// Servable, but due for a background reload
    Stale,
    /// At or past `expire_after_write`; treated as absent
    Expired,
}

// == Cache Entry ==
/// Represents a single cache entry with value and write metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// When the value was written (load, refresh or put)
    pub written_at: Instant,
    /// Store-wide write sequence number, used to detect superseded refreshes
    pub generation: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry written now.
    pub fn new(value: V, generation: u64) -> Self {
        Self {
            value,
            written_at: Instant::now(),
            generation,
        }
    }

    /// Time elapsed since the entry was written.
    pub fn age(&self) -> Duration {
        self.written_at.elapsed()
    }

    // == Is Expired ==
    /// An entry is expired once its age is greater than or equal to the
    /// expiry threshold.
    pub fn is_expired(&self, expire_after_write: Duration) -> bool {
        self.age() >= expire_after_write
    }

    // == Freshness ==
    /// Classifies the entry against the refresh and expiry thresholds.
    ///
    /// Expiry is checked first, so a refresh threshold beyond the expiry
    /// threshold never yields `Stale`.
    pub fn freshness(&self, config: &CacheConfig) -> Freshness {
        let age = self.age();
        if age >= config.expire_after_write {
            Freshness::Expired
        } else if age >= config.refresh_after_write {
            Freshness::Stale
        } else {
            Freshness::Fresh
        }
    }
}
