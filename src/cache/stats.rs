//! Cache Statistics Module
//!
//! Tracks hit/miss/load/refresh counters and the size high-water mark.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Cache Stats ==
/// Point-in-time snapshot of cache statistics.
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    /// Reads served from a live entry
    pub hits: u64,
    /// Reads that had to invoke the loader
    pub misses: u64,
    /// Entries removed to respect the size bound
    pub evictions: u64,
    pub load_successes: u64,
    pub load_failures: u64,
    pub refresh_successes: u64,
    pub refresh_failures: u64,
    /// Refresh requests rejected because the refresh queue was full
    pub refreshes_dropped: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Largest size reached since `reset_time`
    pub highest_size: usize,
    /// When `highest_size` was reached
    pub highest_time: DateTime<Utc>,
    /// When the cache was initialized
    pub reset_time: DateTime<Utc>,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no requests have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Watermark {
    size: usize,
    time: DateTime<Utc>,
}

// == Stats Tracker ==
/// Thread-safe statistics owned by a single cache store.
///
/// Counters are atomics so refresh workers can record outcomes without the
/// entry lock. The watermark pair sits behind its own mutex so size and time
/// always change together.
#[derive(Debug)]
pub struct StatsTracker {
    reset_time: DateTime<Utc>,
    watermark: Mutex<Watermark>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    load_successes: AtomicU64,
    load_failures: AtomicU64,
    refresh_successes: AtomicU64,
    refresh_failures: AtomicU64,
    refreshes_dropped: AtomicU64,
}

impl Default for StatsTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StatsTracker {
    // == Constructor ==
    /// Creates a tracker whose reset time is now.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            reset_time: now,
            watermark: Mutex::new(Watermark { size: 0, time: now }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            load_successes: AtomicU64::new(0),
            load_failures: AtomicU64::new(0),
            refresh_successes: AtomicU64::new(0),
            refresh_failures: AtomicU64::new(0),
            refreshes_dropped: AtomicU64::new(0),
        }
    }

    // == Observe Size ==
    /// Records the current size, raising the high-water mark if it is exceeded.
    pub fn observe(&self, size: usize) {
        let mut watermark = self.watermark.lock().unwrap_or_else(PoisonError::into_inner);
        if size > watermark.size {
            watermark.size = size;
            watermark.time = Utc::now();
        }
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_success(&self) {
        self.load_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_load_failure(&self) {
        self.load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_success(&self) {
        self.refresh_successes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_failure(&self) {
        self.refresh_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_refresh_dropped(&self) {
        self.refreshes_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// When the tracker was created. Fixed for the tracker's lifetime.
    pub fn reset_time(&self) -> DateTime<Utc> {
        self.reset_time
    }

    pub fn highest_size(&self) -> usize {
        self.watermark().size
    }

    pub fn highest_time(&self) -> DateTime<Utc> {
        self.watermark().time
    }

    fn watermark(&self) -> Watermark {
        *self.watermark.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // == Snapshot ==
    /// Copies the current counters into a `CacheStats`.
    pub fn snapshot(&self, total_entries: usize) -> CacheStats {
        let watermark = self.watermark();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            load_successes: self.load_successes.load(Ordering::Relaxed),
            load_failures: self.load_failures.load(Ordering::Relaxed),
            refresh_successes: self.refresh_successes.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            refreshes_dropped: self.refreshes_dropped.load(Ordering::Relaxed),
            total_entries,
            highest_size: watermark.size,
            highest_time: watermark.time,
            reset_time: self.reset_time,
        }
    }
}
