use std::time::Instant;

/// A cached value with its absolute expiry.
///
/// Entries are never mutated; a `set` replaces the whole entry.
#[derive(Debug, Clone)]
pub(crate) struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    pub(crate) fn new(value: V, expires_at: Instant) -> Self {
        Self { value, expires_at }
    }

    pub(crate) fn value(&self) -> &V {
        &self.value
    }

    /// An entry is expired once `now` reaches its expiry instant.
    pub(crate) fn is_expired_at(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
