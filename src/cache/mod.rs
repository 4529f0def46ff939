//! Cache Module
//!
//! Provides in-memory caching with TTL expiration and oldest-first eviction.

mod entry;
mod order;
mod stats;
mod store;
mod ttl_cache;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use order::InsertionOrder;
pub use stats::{hit_rate_percent, CacheCounters, CacheStats};
pub use store::CacheStore;
pub use ttl_cache::{TtlCache, REPORTS_PREFIX, USER_PREFIX};
