//! Error types for the loading cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Boxed error returned by loaders.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

// == Config Error Enum ==
/// Invalid cache configuration, detected when the store is first built.
///
/// Cloneable so the same failure can be handed to every caller that raced
/// to initialize the cache.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("maximum_size must be positive")]
    InvalidMaximumSize,

    #[error("{0} must be a positive duration")]
    InvalidDuration(&'static str),

    #[error("refresh_workers must be positive")]
    InvalidRefreshWorkers,

    #[error("refresh_queue_capacity must be positive")]
    InvalidQueueCapacity,

    #[error("no tokio runtime available to run refresh workers")]
    RuntimeUnavailable,
}

// == Cache Error Enum ==
/// Unified error type for the cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// The cache could not be constructed
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The loader failed while filling a missing or expired key
    #[error("Failed to load {key}: {source}")]
    Load {
        key: String,
        #[source]
        source: BoxError,
    },

    /// The loader failed during a background refresh; only ever logged
    #[error("Failed to refresh {key}: {source}")]
    Refresh {
        key: String,
        #[source]
        source: BoxError,
    },

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl CacheError {
    /// Returns true when a load failed because the origin has no such item.
    pub fn is_origin_not_found(&self) -> bool {
        match self {
            CacheError::Load { source, .. } => source
                .downcast_ref::<std::io::Error>()
                .is_some_and(|err| err.kind() == std::io::ErrorKind::NotFound),
            _ => false,
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Load { .. } if self.is_origin_not_found() => StatusCode::NOT_FOUND,
            CacheError::Load { .. } => StatusCode::BAD_GATEWAY,
            CacheError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
