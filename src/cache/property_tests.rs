//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the capacity, eviction, expiry and statistics rules.

use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cache::{hit_rate_percent, CacheStore, TtlCache};
use crate::clock::ManualClock;

// == Test Configuration ==
const TEST_CAPACITY: usize = 100;
const TEST_DEFAULT_TTL_MS: u64 = 300_000;

fn new_store(capacity: usize) -> (CacheStore<String>, ManualClock) {
    let clock = ManualClock::new(1_000_000);
    let store = CacheStore::new(capacity, TEST_DEFAULT_TTL_MS, Arc::new(clock.clone()));
    (store, clock)
}

// == Strategies ==
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}".prop_map(|s| s)
}

fn valid_value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 ]{1,256}".prop_map(|s| s)
}

fn unique_keys_strategy(min: usize, max: usize) -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set(valid_key_strategy(), min..max)
        .prop_map(|set| set.into_iter().collect())
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: String },
    Get { key: String },
    Has { key: String },
    Delete { key: String },
    Advance { ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    // A small key space so operations actually collide
    let key = "[a-e]";
    prop_oneof![
        (key, valid_value_strategy()).prop_map(|(key, value)| CacheOp::Set { key, value }),
        key.prop_map(|key| CacheOp::Get { key }),
        key.prop_map(|key| CacheOp::Has { key }),
        key.prop_map(|key| CacheOp::Delete { key }),
        (0u64..200_000).prop_map(|ms| CacheOp::Advance { ms }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any sequence of operations, hits and misses reflect exactly the `get`
    // calls that found and did not find a live value, and the reported hit
    // rate follows from them.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        let (mut store, clock) = new_store(3);
        let mut expected_hits: u64 = 0;
        let mut expected_misses: u64 = 0;

        for op in ops {
            match op {
                CacheOp::Set { key, value } => store.set(key, value, None),
                CacheOp::Get { key } => match store.get(&key) {
                    Some(_) => expected_hits += 1,
                    None => expected_misses += 1,
                },
                CacheOp::Has { key } => {
                    store.has(&key);
                }
                CacheOp::Delete { key } => {
                    store.delete(&key);
                }
                CacheOp::Advance { ms } => clock.advance(ms),
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, expected_hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, expected_misses, "Misses mismatch");
        prop_assert_eq!(stats.hit_rate, hit_rate_percent(expected_hits, expected_misses));
        prop_assert_eq!(stats.total_items, store.len());
    }

    // For any sequence of stores, the entry count never exceeds capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec(
            (valid_key_strategy(), valid_value_strategy()),
            1..200
        )
    ) {
        let capacity = 50;
        let (mut store, _) = new_store(capacity);

        for (key, value) in entries {
            store.set(key, value, None);
            prop_assert!(
                store.len() <= capacity,
                "Cache size {} exceeds capacity {}",
                store.len(),
                capacity
            );
        }
    }

    // Filling to capacity and storing one more distinct key evicts exactly
    // the first key stored; the newest `capacity` entries remain.
    #[test]
    fn prop_oldest_eviction_order(
        keys in unique_keys_strategy(2, 12),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        prop_assume!(!keys.contains(&new_key));

        let capacity = keys.len();
        let (mut store, clock) = new_store(capacity);

        for key in &keys {
            store.set(key.clone(), format!("value_{}", key), None);
            clock.advance(1);
        }
        prop_assert_eq!(store.len(), capacity);

        store.set(new_key.clone(), new_value.clone(), None);

        prop_assert_eq!(store.len(), capacity);
        prop_assert!(!store.has(&keys[0]), "Oldest key '{}' should be evicted", keys[0]);
        prop_assert_eq!(store.get(&new_key), Some(new_value));
        for key in keys.iter().skip(1) {
            prop_assert!(store.has(key), "Key '{}' should still exist", key);
        }
    }

    // A value stored with any positive TTL is readable at once and absent
    // from both `get` and `has` once the TTL has passed.
    #[test]
    fn prop_ttl_expiration_behavior(
        key in valid_key_strategy(),
        value in valid_value_strategy(),
        ttl_ms in 1u64..10_000_000
    ) {
        let (mut store, clock) = new_store(TEST_CAPACITY);

        store.set(key.clone(), value.clone(), Some(ttl_ms));
        prop_assert_eq!(store.get(&key), Some(value));

        clock.advance(ttl_ms + 1);
        prop_assert_eq!(store.get(&key), None);
        prop_assert!(!store.has(&key));
    }

    // `get_or_set` twice in a row runs the factory exactly once.
    #[test]
    fn prop_get_or_set_idempotent(key in valid_key_strategy(), value in valid_value_strategy()) {
        let clock = ManualClock::new(0);
        let cache: TtlCache<String> = TtlCache::with_clock(TEST_CAPACITY, TEST_DEFAULT_TTL_MS, Arc::new(clock));
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let (first, second) = tokio_test::block_on(async {
            let first = cache
                .get_or_set(&key, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(value.clone())
                }, None)
                .await;
            let second = cache
                .get_or_set(&key, move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(String::from("other"))
                }, None)
                .await;
            (first, second)
        });

        prop_assert_eq!(first, second);
        prop_assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    // Deleting a stored key makes it absent and removes it from `keys()`.
    #[test]
    fn prop_delete_removes_entry(keys in unique_keys_strategy(1, 20), index in 0usize..20) {
        let (mut store, _) = new_store(TEST_CAPACITY);
        for key in &keys {
            store.set(key.clone(), "v".to_string(), None);
        }

        let target = keys[index % keys.len()].clone();
        prop_assert!(store.delete(&target));

        prop_assert!(!store.has(&target));
        let remaining: HashSet<String> = store.keys().into_iter().collect();
        prop_assert_eq!(remaining.len(), keys.len() - 1);
        prop_assert!(!remaining.contains(&target));
    }
}
