//! Cache contract and statistics.
//!
//! The orchestration layer only talks to a cache through [`Cache`], so tests
//! can substitute any implementation for the in-memory [`ExpiringStore`].
//!
//! [`ExpiringStore`]: super::ExpiringStore

use std::time::Duration;

/// Cache contract: keyed values with per-entry expiry.
///
/// Implementations must be safe to call from any number of threads.
pub trait Cache<V>: Send + Sync {
    /// Get a live value. Expired entries are reported as absent.
    fn get(&self, key: &str) -> Option<V>;

    /// Insert or fully replace a value. A zero TTL selects the cache default.
    fn set(&self, key: &str, value: V, ttl: Duration);

    /// Stop any background maintenance. Callers must not use the cache after.
    fn stop(&self);
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses, including reads of expired entries.
    pub misses: u64,
    /// Number of entries currently held, expired ones included.
    pub entry_count: u64,
    /// Number of completed reclamation sweeps.
    pub sweeps: u64,
    /// Total entries removed by sweeps.
    pub reclaimed: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_stats_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty_stats = CacheStats::default();
        assert!((empty_stats.hit_rate() - 0.0).abs() < 0.001);
    }
}
