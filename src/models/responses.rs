//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::{CacheStats, STATUS_OK};

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The cached or freshly loaded value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the FETCH operation (GET /fetch/:key)
#[derive(Debug, Clone, Serialize)]
pub struct FetchResponse {
    pub key: String,
    /// Whether a live entry is cached; never triggers a load
    pub present: bool,
}

impl FetchResponse {
    pub fn new(key: impl Into<String>, present: bool) -> Self {
        Self {
            key: key.into(),
            present,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Result message
    pub message: String,
    /// The key that was set
    pub key: String,
    /// Status code returned by the cache
    pub code: i32,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>, code: i32) -> Self {
        let key = key.into();
        let message = if code == STATUS_OK {
            format!("Key '{}' set successfully", key)
        } else {
            format!("Key '{}' could not be set", key)
        };
        Self { message, key, code }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Result message
    pub message: String,
    /// The key that was deleted
    pub key: String,
    /// `1` when an entry was removed, `-1` when none was present
    pub code: i32,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>, code: i32) -> Self {
        let key = key.into();
        let message = if code == STATUS_OK {
            format!("Key '{}' deleted successfully", key)
        } else {
            format!("Key '{}' was not cached", key)
        };
        Self { message, key, code }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub load_successes: u64,
    pub load_failures: u64,
    pub refresh_successes: u64,
    pub refresh_failures: u64,
    pub refreshes_dropped: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Largest number of entries held since initialization
    pub highest_size: usize,
    pub highest_time: DateTime<Utc>,
    pub reset_time: DateTime<Utc>,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            load_successes: stats.load_successes,
            load_failures: stats.load_failures,
            refresh_successes: stats.refresh_successes,
            refresh_failures: stats.refresh_failures,
            refreshes_dropped: stats.refreshes_dropped,
            total_entries: stats.total_entries,
            highest_size: stats.highest_size,
            highest_time: stats.highest_time,
            reset_time: stats.reset_time,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}
