//! Background Tasks Module
//!
//! Contains the tasks that run alongside the cache.
//!
//! # Tasks
//! - Refresh workers: run refresh-ahead reloads for stale entries
//! - TTL Cleanup: Removes expired cache entries at configured intervals

mod cleanup;
mod refresh;

pub use cleanup::spawn_cleanup_task;
pub use refresh::{RefreshExecutor, RefreshJob};
