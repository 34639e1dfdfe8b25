//! Refresh Cache - A read-through loading cache with refresh-ahead
//!
//! Values are loaded on demand from a [`cache::Loader`], expire a fixed time
//! after they were written, and are reloaded in the background once they turn
//! stale. The cache is size-bounded with LRU eviction and served over HTTP by
//! the `refresh_cache` binary.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod origin;
pub mod tasks;

pub use api::AppState;
pub use cache::{BlockingLoader, CacheService, CacheStats, LoadingCache, Loader};
pub use config::{CacheConfig, Config, SaturationPolicy, TimeUnit};
pub use error::{BoxError, CacheError, ConfigError};
pub use origin::FileLoader;
pub use tasks::spawn_cleanup_task;
