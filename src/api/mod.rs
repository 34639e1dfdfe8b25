//! API Module
//!
//! HTTP handlers and routing for the cache server REST API.
//!
//! # Endpoints
//! - `GET /get/:key` - Read-through lookup
//! - `GET /fetch/:key` - Presence check
//! - `PUT /set` - Store a key-value pair
//! - `DELETE /del/:key` - Invalidate a key
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
