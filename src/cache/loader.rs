//! Loader Module
//!
//! The contract between the cache and the data source it fronts.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BoxError;

/// Produces the value for a key from the underlying data source.
///
/// Called on a miss or expiry (awaited by the reader) and from refresh
/// workers when an entry goes stale. Calls for different keys may run
/// concurrently; for one key the cache allows at most one refresh in flight.
#[async_trait]
pub trait Loader<K, V>: Send + Sync + 'static {
    async fn load(&self, key: &K) -> Result<V, BoxError>;
}

// == Blocking Loader ==
/// Adapts a synchronous, possibly slow function into a [`Loader`].
///
/// The function runs on tokio's blocking thread pool so it never stalls the
/// async workers.
pub struct BlockingLoader<F> {
    func: Arc<F>,
}

impl<F> BlockingLoader<F> {
    pub fn new(func: F) -> Self {
        Self {
            func: Arc::new(func),
        }
    }
}

#[async_trait]
impl<K, V, F> Loader<K, V> for BlockingLoader<F>
where
    K: Clone + Send + Sync + 'static,
    V: Send + 'static,
    F: Fn(&K) -> Result<V, BoxError> + Send + Sync + 'static,
{
    async fn load(&self, key: &K) -> Result<V, BoxError> {
        let func = Arc::clone(&self.func);
        let key = key.clone();
        tokio::task::spawn_blocking(move || func(&key)).await?
    }
}
