//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

// == Cache Entry ==
/// Represents a single cache entry with its payload and expiry metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry<T> {
    /// The stored payload
    pub data: T,
    /// When the entry was stored (Unix milliseconds)
    pub stored_at: u64,
    /// Time-to-live in milliseconds
    pub ttl_ms: u64,
}

impl<T> CacheEntry<T> {
    // == Constructor ==
    /// Creates a new cache entry stored at `now_ms`.
    pub fn new(data: T, now_ms: u64, ttl_ms: u64) -> Self {
        Self {
            data,
            stored_at: now_ms,
            ttl_ms,
        }
    }

    // == Is Live ==
    /// Checks whether the entry is still live at `now_ms`.
    ///
    /// Boundary condition: an entry whose age equals its TTL is still live. It
    /// expires on the first millisecond past the TTL.
    pub fn is_live(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.stored_at) <= self.ttl_ms
    }

    // == Is Expired ==
    pub fn is_expired(&self, now_ms: u64) -> bool {
        !self.is_live(now_ms)
    }
}
