//! Orderline Storage - expiring cache and durable store contract
//!
//! The in-memory [`ExpiringStore`] that fronts every lookup, the [`Cache`]
//! trait the orchestration layer programs against, and the [`OrderStore`]
//! trait implemented by durable backends.

pub mod cache;
pub mod durable;

pub use cache::{
    Cache, CacheConfig, CacheStats, ExpiringStore, DEFAULT_CACHE_TTL, DEFAULT_SWEEP_INTERVAL,
    MAX_CACHE_TTL,
};
pub use durable::{InMemoryOrderStore, OrderStore};

// ============================================================================
// PROPERTY TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use std::time::Duration;

    proptest! {
        /// After any sequence of sets, each key holds the last value written.
        #[test]
        fn prop_last_set_wins(writes in prop::collection::vec(("[a-d]", any::<u32>()), 1..40)) {
            let store: ExpiringStore<u32> = ExpiringStore::with_defaults();
            let mut expected = std::collections::HashMap::new();

            for (key, value) in &writes {
                store.set(key.as_str(), *value, Duration::from_secs(60));
                expected.insert(key.clone(), *value);
            }

            prop_assert_eq!(store.len(), expected.len());
            for (key, value) in expected {
                prop_assert_eq!(store.get(&key), Some(value));
            }
        }

        /// A live entry survives a sweep.
        #[test]
        fn prop_purge_keeps_live_entries(keys in prop::collection::hash_set("[a-z]{1,6}", 0..20)) {
            let store: ExpiringStore<usize> = ExpiringStore::with_defaults();
            for (i, key) in keys.iter().enumerate() {
                store.set(key.as_str(), i, Duration::from_secs(60));
            }

            prop_assert_eq!(store.purge_expired(), 0);
            prop_assert_eq!(store.len(), keys.len());
        }
    }
}
