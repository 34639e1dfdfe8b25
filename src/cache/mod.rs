//! Cache Module
//!
//! Read-through caching with write-age expiry, LRU eviction and
//! refresh-ahead reloads.

mod entry;
mod loader;
mod lru;
mod service;
mod stats;
mod store;

#[cfg(test)]
mod test_support;

// Re-export public types
pub use entry::{CacheEntry, Freshness};
pub use loader::{BlockingLoader, Loader};
pub use lru::LruTracker;
pub use service::{CacheService, LoadingCache, STATUS_NOT_FOUND, STATUS_OK};
pub use stats::{CacheStats, StatsTracker};
pub use store::CacheStore;
