//! Expiring store configuration.

use std::time::Duration;

/// Fallback TTL applied when a caller passes a zero TTL and no other default
/// is configured (5 minutes).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);

/// Fallback interval between reclamation sweeps (1 minute).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Longest TTL an entry is given (100 years). Longer TTLs are clamped so the
/// expiry instant stays representable.
pub const MAX_CACHE_TTL: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Configuration for an [`ExpiringStore`](super::ExpiringStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL substituted for a zero TTL passed to `set`.
    pub default_ttl: Duration,
    /// Interval substituted for a zero interval passed to `start_reclamation`.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: DEFAULT_CACHE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl CacheConfig {
    /// Create a new cache config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the default TTL.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the default sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Resolve the TTL for a `set` call.
    ///
    /// A zero TTL means "use the default", never "already expired" and never
    /// "keep forever". The default itself is never zero. The result is capped
    /// at [`MAX_CACHE_TTL`].
    pub fn effective_ttl(&self, ttl: Duration) -> Duration {
        let ttl = if !ttl.is_zero() {
            ttl
        } else if !self.default_ttl.is_zero() {
            self.default_ttl
        } else {
            DEFAULT_CACHE_TTL
        };
        ttl.min(MAX_CACHE_TTL)
    }

    /// Resolve the sweep interval for `start_reclamation`.
    pub fn effective_interval(&self, interval: Duration) -> Duration {
        if !interval.is_zero() {
            interval
        } else if !self.sweep_interval.is_zero() {
            self.sweep_interval
        } else {
            DEFAULT_SWEEP_INTERVAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_config_builder() {
        let config = CacheConfig::new()
            .with_ttl(Duration::from_secs(30))
            .with_sweep_interval(Duration::from_millis(250));

        assert_eq!(config.default_ttl, Duration::from_secs(30));
        assert_eq!(config.sweep_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_effective_ttl() {
        let config = CacheConfig::new().with_ttl(Duration::from_secs(30));
        assert_eq!(config.effective_ttl(Duration::from_secs(2)), Duration::from_secs(2));
        assert_eq!(config.effective_ttl(Duration::ZERO), Duration::from_secs(30));

        let zeroed = CacheConfig::new().with_ttl(Duration::ZERO);
        assert_eq!(zeroed.effective_ttl(Duration::ZERO), DEFAULT_CACHE_TTL);
    }

    #[test]
    fn test_effective_ttl_is_capped() {
        let config = CacheConfig::new().with_ttl(Duration::MAX);
        assert_eq!(config.effective_ttl(Duration::MAX), MAX_CACHE_TTL);
        assert_eq!(config.effective_ttl(Duration::ZERO), MAX_CACHE_TTL);
        assert_eq!(config.effective_ttl(MAX_CACHE_TTL), MAX_CACHE_TTL);
    }

    #[test]
    fn test_effective_interval() {
        let config = CacheConfig::default();
        assert_eq!(config.effective_interval(Duration::ZERO), DEFAULT_SWEEP_INTERVAL);

        let zeroed = CacheConfig::new().with_sweep_interval(Duration::ZERO);
        assert_eq!(zeroed.effective_interval(Duration::ZERO), DEFAULT_SWEEP_INTERVAL);
        assert_eq!(
            zeroed.effective_interval(Duration::from_millis(5)),
            Duration::from_millis(5)
        );
    }
}
