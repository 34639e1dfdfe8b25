//! Configuration Module
//!
//! Cache policy configuration plus the server settings loaded from
//! environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

// == Time Unit ==
/// Unit used to interpret the expiry and refresh amounts read from the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    Seconds,
    #[default]
    Minutes,
    Hours,
}

impl TimeUnit {
    /// Converts an amount of this unit into a `Duration`.
    pub fn duration(self, amount: u64) -> Duration {
        match self {
            TimeUnit::Seconds => Duration::from_secs(amount),
            TimeUnit::Minutes => Duration::from_secs(amount.saturating_mul(60)),
            TimeUnit::Hours => Duration::from_secs(amount.saturating_mul(3600)),
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "seconds" => Ok(TimeUnit::Seconds),
            "m" | "min" | "mins" | "minutes" => Ok(TimeUnit::Minutes),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hours),
            other => Err(format!("unknown time unit: {}", other)),
        }
    }
}

// == Saturation Policy ==
/// What to do with a refresh request when the refresh queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaturationPolicy {
    /// Drop the request; a later stale read may try again
    #[default]
    Drop,
    /// Make the reader wait for queue capacity
    Wait,
}

impl FromStr for SaturationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(SaturationPolicy::Drop),
            "wait" => Ok(SaturationPolicy::Wait),
            other => Err(format!("unknown saturation policy: {}", other)),
        }
    }
}

// == Cache Config ==
/// Eviction, expiration and refresh policy for a loading cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries held before least recently used ones are evicted
    pub maximum_size: usize,
    /// Age at which an entry is treated as absent
    pub expire_after_write: Duration,
    /// Age at which a read schedules a background reload
    pub refresh_after_write: Duration,
    /// Number of refresh worker tasks
    pub refresh_workers: usize,
    /// Pending refreshes allowed before the saturation policy applies
    pub refresh_queue_capacity: usize,
    /// Behaviour when the refresh queue is full
    pub saturation_policy: SaturationPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            maximum_size: 1000,
            expire_after_write: TimeUnit::Minutes.duration(60),
            refresh_after_write: TimeUnit::Minutes.duration(120),
            refresh_workers: 4,
            refresh_queue_capacity: 64,
            saturation_policy: SaturationPolicy::Drop,
        }
    }
}

impl CacheConfig {
    pub fn with_maximum_size(mut self, maximum_size: usize) -> Self {
        self.maximum_size = maximum_size;
        self
    }

    pub fn with_expire_after_write(mut self, duration: Duration) -> Self {
        self.expire_after_write = duration;
        self
    }

    pub fn with_refresh_after_write(mut self, duration: Duration) -> Self {
        self.refresh_after_write = duration;
        self
    }

    pub fn with_refresh_workers(mut self, workers: usize) -> Self {
        self.refresh_workers = workers;
        self
    }

    pub fn with_refresh_queue_capacity(mut self, capacity: usize) -> Self {
        self.refresh_queue_capacity = capacity;
        self
    }

    pub fn with_saturation_policy(mut self, policy: SaturationPolicy) -> Self {
        self.saturation_policy = policy;
        self
    }

    // == Validate ==
    /// Checks the configuration before a store is built from it.
    ///
    /// A refresh threshold at or beyond the expiry threshold is accepted: the
    /// two policies are independent, and in that case entries simply expire
    /// before they ever become eligible for refresh.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.maximum_size == 0 {
            return Err(ConfigError::InvalidMaximumSize);
        }
        if self.expire_after_write.is_zero() {
            return Err(ConfigError::InvalidDuration("expire_after_write"));
        }
        if self.refresh_after_write.is_zero() {
            return Err(ConfigError::InvalidDuration("refresh_after_write"));
        }
        if self.refresh_workers == 0 {
            return Err(ConfigError::InvalidRefreshWorkers);
        }
        if self.refresh_queue_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity);
        }
        Ok(())
    }

    /// True when entries can reach the refresh threshold before expiring.
    pub fn refresh_enabled(&self) -> bool {
        self.refresh_after_write < self.expire_after_write
    }

    /// Loads the cache policy from environment variables.
    ///
    /// # Environment Variables
    /// - `MAXIMUM_SIZE` - Maximum cache entries (default: 1000)
    /// - `EXPIRE_AFTER_WRITE` - Expiry age in `TIME_UNIT` (default: 60)
    /// - `REFRESH_AFTER_WRITE` - Refresh age in `TIME_UNIT` (default: 120)
    /// - `TIME_UNIT` - `seconds`, `minutes` or `hours` (default: minutes)
    /// - `REFRESH_WORKERS` - Refresh worker count (default: 4)
    /// - `REFRESH_QUEUE_CAPACITY` - Pending refresh limit (default: 64)
    /// - `REFRESH_SATURATION_POLICY` - `drop` or `wait` (default: drop)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let unit: TimeUnit = env_or("TIME_UNIT", TimeUnit::default());

        Self {
            maximum_size: env_or("MAXIMUM_SIZE", defaults.maximum_size),
            expire_after_write: unit.duration(env_or("EXPIRE_AFTER_WRITE", 60)),
            refresh_after_write: unit.duration(env_or("REFRESH_AFTER_WRITE", 120)),
            refresh_workers: env_or("REFRESH_WORKERS", defaults.refresh_workers),
            refresh_queue_capacity: env_or(
                "REFRESH_QUEUE_CAPACITY",
                defaults.refresh_queue_capacity,
            ),
            saturation_policy: env_or("REFRESH_SATURATION_POLICY", defaults.saturation_policy),
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache policy
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Directory the file loader reads values from
    pub data_dir: PathBuf,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - Every variable read by [`CacheConfig::from_env`]
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `DATA_DIR` - Origin directory for the file loader (default: ./data)
    pub fn from_env() -> Self {
        Self {
            cache: CacheConfig::from_env(),
            server_port: env_or("SERVER_PORT", 3000),
            cleanup_interval: env_or("CLEANUP_INTERVAL", 60),
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            server_port: 3000,
            cleanup_interval: 60,
            data_dir: PathBuf::from("./data"),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
