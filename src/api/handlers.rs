//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::cache::{CacheService, LoadingCache, STATUS_OK};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::models::{
    validate_key, DeleteResponse, FetchResponse, GetResponse, HealthResponse, SetRequest,
    SetResponse, StatsResponse,
};
use crate::origin::FileLoader;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe loading cache
    pub cache: Arc<LoadingCache<String, String>>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(cache: Arc<LoadingCache<String, String>>) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The cache reads misses from files under `config.data_dir`. Its store is
    /// built on the first request.
    pub fn from_config(config: &Config) -> Self {
        let loader = FileLoader::new(&config.data_dir);
        let cache = LoadingCache::new("file-cache", config.cache.clone(), loader);
        Self::new(Arc::new(cache))
    }
}

fn check_key(key: &str) -> Result<()> {
    match validate_key(key) {
        Some(error_msg) => Err(CacheError::InvalidRequest(error_msg)),
        None => Ok(()),
    }
}

/// Handler for GET /get/:key
///
/// Returns the cached value, reading it from the origin on a miss.
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    check_key(&key)?;
    let value = state.cache.get(&key).await?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for GET /fetch/:key
///
/// Reports whether a live entry is cached without loading anything.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<FetchResponse>> {
    check_key(&key)?;
    let present = state.cache.fetch(&key).await;

    Ok(Json(FetchResponse::new(key, present)))
}

/// Handler for PUT /set
///
/// Stores a key-value pair in the cache as a fresh write.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let code = state.cache.put(req.key.clone(), req.value).await;
    if code != STATUS_OK {
        // The only way a put is refused is a cache that failed to build
        state.cache.store()?;
    }

    Ok(Json(SetResponse::new(req.key, code)))
}

/// Handler for DELETE /del/:key
///
/// Invalidates a key. Responds 404 with code `-1` when nothing was cached.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<(StatusCode, Json<DeleteResponse>)> {
    check_key(&key)?;
    let code = state.cache.del(&key).await;

    let status = if code == STATUS_OK {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    Ok((status, Json(DeleteResponse::new(key, code))))
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Result<Json<StatsResponse>> {
    let stats = state.cache.stats().await?;

    Ok(Json(StatsResponse::from(stats)))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
