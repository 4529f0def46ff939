//! Cache Statistics Module
//!
//! Tracks hit/miss counters and builds the reported statistics snapshot.

use serde::Serialize;

// == Cache Counters ==
/// Running counters kept by a store.
#[derive(Debug, Clone, Default)]
pub struct CacheCounters {
    /// Number of live lookups
    pub hits: u64,
    /// Number of lookups that found nothing live
    pub misses: u64,
    /// Number of entries evicted to respect capacity
    pub evictions: u64,
}

impl CacheCounters {
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Eviction ==
    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    // == Reset ==
    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

// == Cache Stats ==
/// Statistics snapshot returned to callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Hit rate as a percentage (0-100), rounded to 2 decimals
    pub hit_rate: f64,
    /// Entries evicted to respect capacity since the last clear
    pub evictions: u64,
    /// Entries physically present, including expired ones not yet swept
    pub total_items: usize,
    /// Estimated memory footprint in kilobytes, rounded to 2 decimals
    pub memory_usage_kb: f64,
}

impl CacheStats {
    /// Builds a snapshot from counters and the estimated byte footprint.
    pub fn from_counters(counters: &CacheCounters, total_items: usize, estimated_bytes: usize) -> Self {
        Self {
            hits: counters.hits,
            misses: counters.misses,
            hit_rate: hit_rate_percent(counters.hits, counters.misses),
            evictions: counters.evictions,
            total_items,
            memory_usage_kb: round2(estimated_bytes as f64 / 1024.0),
        }
    }
}

// == Hit Rate ==
/// Calculates `100 * hits / (hits + misses)` rounded to 2 decimals.
///
/// Returns 0.0 if no lookups have been made.
pub fn hit_rate_percent(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        round2(100.0 * hits as f64 / total as f64)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_new() {
        let counters = CacheCounters::new();
        assert_eq!(counters.hits, 0);
        assert_eq!(counters.misses, 0);
        assert_eq!(counters.evictions, 0);
    }

    #[test]
    fn test_hit_rate_no_requests() {
        assert_eq!(hit_rate_percent(0, 0), 0.0);
    }

    #[test]
    fn test_hit_rate_all_hits() {
        assert_eq!(hit_rate_percent(3, 0), 100.0);
    }

    #[test]
    fn test_hit_rate_rounded() {
        // 2 / 3 = 66.666...
        assert_eq!(hit_rate_percent(2, 1), 66.67);
        assert_eq!(hit_rate_percent(1, 2), 33.33);
    }

    #[test]
    fn test_reset() {
        let mut counters = CacheCounters::new();
        counters.record_hit();
        counters.record_miss();
        counters.record_eviction();

        counters.reset();
        assert_eq!(counters.hits, 0);
        assert_eq!(counters.misses, 0);
        assert_eq!(counters.evictions, 0);
    }

    #[test]
    fn test_stats_from_counters() {
        let mut counters = CacheCounters::new();
        counters.record_hit();
        counters.record_miss();
        counters.record_eviction();

        let stats = CacheStats::from_counters(&counters, 4, 2048);
        assert_eq!(stats.hit_rate, 50.0);
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.total_items, 4);
        assert_eq!(stats.memory_usage_kb, 2.0);
    }
}
