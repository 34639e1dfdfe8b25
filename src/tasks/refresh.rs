//! Refresh Executor
//!
//! A fixed pool of background tasks that run refresh-ahead reloads off the
//! reader's path.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::SaturationPolicy;

/// A unit of refresh work. Completing the future completes the refresh.
pub type RefreshJob = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Bounded worker pool for refresh jobs.
///
/// Workers share one bounded queue. Dropping the executor closes the queue;
/// workers finish whatever is already queued and then exit.
pub struct RefreshExecutor {
    sender: mpsc::Sender<RefreshJob>,
    policy: SaturationPolicy,
    workers: Vec<JoinHandle<()>>,
}

impl RefreshExecutor {
    /// Spawns `workers` tasks on `handle`, fed by a queue of `queue_capacity` jobs.
    ///
    /// Both sizes must be positive; `CacheConfig::validate` enforces this
    /// before a store is built.
    pub fn spawn(
        handle: &Handle,
        workers: usize,
        queue_capacity: usize,
        policy: SaturationPolicy,
    ) -> Self {
        let (sender, receiver) = mpsc::channel::<RefreshJob>(queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..workers)
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                handle.spawn(async move {
                    loop {
                        // The guard is released before the job runs
                        let job = receiver.lock().await.recv().await;
                        match job {
                            Some(job) => job.await,
                            None => break,
                        }
                    }
                    debug!(worker, "Refresh worker stopped");
                })
            })
            .collect();

        Self {
            sender,
            policy,
            workers,
        }
    }

    // == Submit ==
    /// Hands a job to the pool.
    ///
    /// Returns false when the job was not accepted, either because the queue
    /// was full under [`SaturationPolicy::Drop`] or because the pool is gone.
    pub async fn submit(&self, job: RefreshJob) -> bool {
        match self.policy {
            SaturationPolicy::Drop => match self.sender.try_send(job) {
                Ok(()) => true,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("Refresh queue is full, dropping refresh request");
                    false
                }
                Err(mpsc::error::TrySendError::Closed(_)) => false,
            },
            SaturationPolicy::Wait => self.sender.send(job).await.is_ok(),
        }
    }
}

impl Drop for RefreshExecutor {
    fn drop(&mut self) {
        debug!(workers = self.workers.len(), "Closing refresh queue");
    }
}
