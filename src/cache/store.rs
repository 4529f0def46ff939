//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with insertion-order tracking and
//! TTL expiration.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::cache::{CacheCounters, CacheEntry, CacheStats, InsertionOrder};
use crate::clock::SharedClock;

// == Cache Store ==
/// Single-threaded cache storage with oldest-first eviction and TTL support.
///
/// Expired entries are logically absent: every read re-checks liveness and
/// removes what it finds expired, so results never depend on the sweep.
#[derive(Debug)]
pub struct CacheStore<T> {
    /// Key-value storage
    entries: HashMap<String, CacheEntry<T>>,
    /// Store order for eviction
    order: InsertionOrder,
    /// Hit/miss counters
    counters: CacheCounters,
    /// Maximum number of entries allowed
    capacity: usize,
    /// TTL in milliseconds for entries stored without an explicit TTL
    default_ttl_ms: u64,
    clock: SharedClock,
}

impl<T: Clone> CacheStore<T> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and default TTL.
    ///
    /// A capacity of 0 is raised to 1 so that a store can always hold the
    /// entry it was just given.
    pub fn new(capacity: usize, default_ttl_ms: u64, clock: SharedClock) -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
            counters: CacheCounters::new(),
            capacity: capacity.max(1),
            default_ttl_ms,
            clock,
        }
    }

    // == Set ==
    /// Stores a value with optional TTL in milliseconds.
    ///
    /// If the key already exists, the value is overwritten and its store time
    /// reset. If a new key would exceed capacity, the oldest stored entry is
    /// evicted first.
    pub fn set(&mut self, key: impl Into<String>, data: T, ttl_ms: Option<u64>) {
        let key = key.into();
        let is_overwrite = self.entries.contains_key(&key);

        if !is_overwrite && self.entries.len() >= self.capacity {
            self.evict_oldest();
        }

        let entry = CacheEntry::new(
            data,
            self.clock.now_ms(),
            ttl_ms.unwrap_or(self.default_ttl_ms),
        );
        self.order.record(&key);
        self.entries.insert(key, entry);
    }

    // == Get ==
    /// Retrieves a live value by key.
    ///
    /// Expired entries are removed and counted as misses.
    pub fn get(&mut self, key: &str) -> Option<T> {
        if self.purge_if_expired(key) {
            self.counters.record_miss();
            return None;
        }

        match self.entries.get(key) {
            Some(entry) => {
                self.counters.record_hit();
                Some(entry.data.clone())
            }
            None => {
                self.counters.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Checks whether a live entry exists without touching the counters.
    pub fn has(&mut self, key: &str) -> bool {
        if self.purge_if_expired(key) {
            return false;
        }
        self.entries.contains_key(key)
    }

    // == Delete ==
    /// Removes an entry by key, returning whether it was present.
    pub fn delete(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_some() {
            self.order.remove(key);
            true
        } else {
            false
        }
    }

    // == Clear ==
    /// Empties the store and resets the hit/miss counters.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        self.counters.reset();
    }

    // == Keys ==
    /// Returns live keys from oldest to newest store.
    pub fn keys(&self) -> Vec<String> {
        let now = self.clock.now_ms();
        self.order
            .iter()
            .filter(|key| {
                self.entries
                    .get(key.as_str())
                    .is_some_and(|entry| entry.is_live(now))
            })
            .cloned()
            .collect()
    }

    // == Delete By Prefix ==
    /// Removes every entry whose key starts with one of `prefixes`.
    ///
    /// Returns the number of entries removed.
    pub fn delete_by_prefix(&mut self, prefixes: &[&str]) -> usize {
        let doomed: Vec<String> = self
            .entries
            .keys()
            .filter(|key| prefixes.iter().any(|prefix| key.starts_with(prefix)))
            .cloned()
            .collect();

        for key in &doomed {
            self.entries.remove(key);
            self.order.remove(key);
        }
        doomed.len()
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let now = self.clock.now_ms();
        let expired_keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired_keys {
            self.entries.remove(key);
            self.order.remove(key);
        }
        expired_keys.len()
    }

    // == Length ==
    /// Returns the number of entries physically present.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn evict_oldest(&mut self) {
        if let Some(evicted) = self.order.pop_oldest() {
            self.entries.remove(&evicted);
            self.counters.record_eviction();
            debug!(key = %evicted, "Evicted oldest cache entry");
        }
    }

    /// Removes `key` if it is present but expired. Returns true when it did.
    fn purge_if_expired(&mut self, key: &str) -> bool {
        let now = self.clock.now_ms();
        let expired = self
            .entries
            .get(key)
            .is_some_and(|entry| entry.is_expired(now));
        if expired {
            self.entries.remove(key);
            self.order.remove(key);
        }
        expired
    }
}

impl<T: Clone + Serialize> CacheStore<T> {
    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats::from_counters(&self.counters, self.entries.len(), self.estimated_bytes())
    }

    /// Estimates the footprint as two bytes per character of key and JSON value.
    fn estimated_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, entry)| {
                let value_len = serde_json::to_string(&entry.data)
                    .map(|json| json.len())
                    .unwrap_or(0);
                (key.len() + value_len) * 2
            })
            .sum()
    }
}
