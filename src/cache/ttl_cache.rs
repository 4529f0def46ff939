//! Shared TTL Cache
//!
//! Cloneable, mutex-serialized handle over a [`CacheStore`], with
//! compute-if-absent, namespaced helpers and an owned background sweep.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::cache::{CacheStats, CacheStore};
use crate::clock::{system_clock, SharedClock};
use crate::tasks::{spawn_periodic, SweepHandle};

/// Key prefix for per-user profile entries.
pub const USER_PREFIX: &str = "user:";
/// Key prefix for per-user report listings.
pub const REPORTS_PREFIX: &str = "reports:";

// == TTL Cache ==
/// Thread-safe TTL cache.
///
/// Clones share the same store and the same sweep.
#[derive(Debug)]
pub struct TtlCache<T> {
    store: Arc<Mutex<CacheStore<T>>>,
    sweep: Arc<Mutex<Option<SweepHandle>>>,
}

impl<T> Clone for TtlCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            sweep: Arc::clone(&self.sweep),
        }
    }
}

impl<T: Clone + Send + 'static> TtlCache<T> {
    /// Creates a cache on the system clock.
    pub fn new(capacity: usize, default_ttl_ms: u64) -> Self {
        Self::with_clock(capacity, default_ttl_ms, system_clock())
    }

    /// Creates a cache reading time from `clock`.
    pub fn with_clock(capacity: usize, default_ttl_ms: u64, clock: SharedClock) -> Self {
        Self {
            store: Arc::new(Mutex::new(CacheStore::new(capacity, default_ttl_ms, clock))),
            sweep: Arc::new(Mutex::new(None)),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: T, ttl_ms: Option<u64>) {
        self.store.lock().set(key, value, ttl_ms);
    }

    pub fn get(&self, key: &str) -> Option<T> {
        let value = self.store.lock().get(key);
        if value.is_none() {
            debug!(key, "Cache miss");
        }
        value
    }

    pub fn has(&self, key: &str) -> bool {
        self.store.lock().has(key)
    }

    pub fn delete(&self, key: &str) -> bool {
        self.store.lock().delete(key)
    }

    pub fn clear(&self) {
        self.store.lock().clear();
    }

    /// Live keys, oldest first.
    pub fn keys(&self) -> Vec<String> {
        self.store.lock().keys()
    }

    /// Entries physically present, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.store.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.lock().is_empty()
    }

    // == Get Or Set ==
    /// Returns the live value for `key`, computing and storing it on a miss.
    ///
    /// `factory` is awaited at most once and only when no live value exists.
    /// Its error is returned unchanged and nothing is stored. The store lock is
    /// released while the factory runs, so concurrent callers missing the same
    /// key may each run their own factory.
    pub async fn get_or_set<F, Fut, E>(&self, key: &str, factory: F, ttl_ms: Option<u64>) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.get(key) {
            return Ok(value);
        }

        let value = factory().await?;
        self.set(key, value.clone(), ttl_ms);
        Ok(value)
    }

    // == Namespaced Helpers ==
    pub fn set_user(&self, user_id: &str, value: T, ttl_ms: Option<u64>) {
        self.set(format!("{USER_PREFIX}{user_id}"), value, ttl_ms);
    }

    pub fn get_user(&self, user_id: &str) -> Option<T> {
        self.get(&format!("{USER_PREFIX}{user_id}"))
    }

    pub fn set_reports(&self, user_id: &str, value: T, ttl_ms: Option<u64>) {
        self.set(format!("{REPORTS_PREFIX}{user_id}"), value, ttl_ms);
    }

    pub fn get_reports(&self, user_id: &str) -> Option<T> {
        self.get(&format!("{REPORTS_PREFIX}{user_id}"))
    }

    /// Drops every cached entry belonging to `user_id`.
    ///
    /// Matches keys starting with `user:<id>` or `reports:<id>`. Returns the
    /// number of entries removed.
    pub fn invalidate_user(&self, user_id: &str) -> usize {
        let user_key = format!("{USER_PREFIX}{user_id}");
        let reports_key = format!("{REPORTS_PREFIX}{user_id}");
        let removed = self
            .store
            .lock()
            .delete_by_prefix(&[user_key.as_str(), reports_key.as_str()]);
        info!(user_id, removed, "Invalidated user cache entries");
        removed
    }

    /// Removes expired entries. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        self.store.lock().cleanup_expired()
    }

    // == Sweep ==
    /// Starts the background sweep, replacing any sweep already running.
    ///
    /// The task holds only a weak reference to the store and exits once every
    /// clone of this cache is dropped.
    ///
    /// # Panics
    /// Must be called from within a tokio runtime.
    pub fn start_sweep(&self, interval: Duration) {
        let store: Weak<Mutex<CacheStore<T>>> = Arc::downgrade(&self.store);
        let handle = spawn_periodic("cache", interval, move || {
            let Some(store) = store.upgrade() else {
                return ControlFlow::Break(());
            };
            let removed = store.lock().cleanup_expired();
            if removed > 0 {
                info!("Cache sweep: removed {} expired entries", removed);
            } else {
                debug!("Cache sweep: no expired entries found");
            }
            ControlFlow::Continue(())
        });

        if let Some(previous) = self.sweep.lock().replace(handle) {
            previous.stop();
        }
    }

    /// Stops the background sweep if one is running.
    pub fn stop_sweep(&self) {
        if let Some(handle) = self.sweep.lock().take() {
            handle.stop();
        }
    }

    pub fn is_sweeping(&self) -> bool {
        self.sweep
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<T: Clone + Send + Serialize + 'static> TtlCache<T> {
    pub fn stats(&self) -> CacheStats {
        self.store.lock().stats()
    }
}
