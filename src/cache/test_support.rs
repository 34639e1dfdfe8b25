//! Shared helpers for cache unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::cache::Loader;
use crate::error::BoxError;

struct Inner {
    value: Mutex<String>,
    calls: AtomicUsize,
    fail: AtomicBool,
    paused: watch::Sender<bool>,
}

/// Loader whose output, failures and progress are driven by the test.
#[derive(Clone)]
pub struct ScriptedLoader {
    inner: Arc<Inner>,
    delay: Duration,
}

impl ScriptedLoader {
    pub fn new(value: &str) -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                value: Mutex::new(value.to_string()),
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                paused,
            }),
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    pub fn set_value(&self, value: &str) {
        *self.inner.value.lock().unwrap() = value.to_string();
    }

    pub fn fail(&self, fail: bool) {
        self.inner.fail.store(fail, Ordering::SeqCst);
    }

    /// Holds every subsequent load until `resume` is called.
    pub fn pause(&self) {
        self.inner.paused.send_replace(true);
    }

    pub fn resume(&self) {
        self.inner.paused.send_replace(false);
    }
}

#[async_trait]
impl Loader<String, String> for ScriptedLoader {
    async fn load(&self, _key: &String) -> Result<String, BoxError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);

        let mut paused = self.inner.paused.subscribe();
        while *paused.borrow_and_update() {
            if paused.changed().await.is_err() {
                break;
            }
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.inner.fail.load(Ordering::SeqCst) {
            return Err("scripted failure".into());
        }
        Ok(self.inner.value.lock().unwrap().clone())
    }
}

/// Polls `condition` until it holds, sleeping a millisecond between checks.
pub async fn wait_for(mut condition: impl FnMut() -> bool) {
    for _ in 0..5_000 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    panic!("condition not reached");
}
