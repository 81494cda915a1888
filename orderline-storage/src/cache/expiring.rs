//! Thread-safe expiring key-value store.
//!
//! Entries live in a `HashMap` behind a reader/writer lock: lookups share the
//! read lock, while `set` and the reclamation sweep take the write lock. The
//! sweep holds the write lock for its whole scan, so its pause grows with the
//! number of keys. That is acceptable for the small-to-moderate key counts
//! this store targets; sharding the map would change that contract.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

use tokio::sync::watch;

use super::config::{CacheConfig, DEFAULT_CACHE_TTL};
use super::entry::CacheEntry;
use super::reclaim::reclaim_task;
use super::traits::{Cache, CacheStats};

/// State shared between the store handle and its reclamation task.
pub(crate) struct StoreInner<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    sweeps: AtomicU64,
    reclaimed: AtomicU64,
}

impl<V> StoreInner<V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sweeps: AtomicU64::new(0),
            reclaimed: AtomicU64::new(0),
        }
    }

    // A writer that panicked mid-call cannot leave a torn entry behind because
    // entries are only ever inserted or removed whole, so poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Remove every entry whose expiry has passed. Returns the number removed.
    pub(crate) fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.write();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired_at(now));
        let removed = before - entries.len();
        drop(entries);

        self.sweeps.fetch_add(1, Ordering::Relaxed);
        self.reclaimed.fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }
}

/// In-memory store mapping order ids to values with per-entry expiry.
///
/// Expired entries are hidden from `get` immediately (lazy expiry) and
/// physically removed by a background sweep started with
/// [`start_reclamation`](Self::start_reclamation). The sweep stops when
/// [`stop`](Self::stop) is called or the store is dropped.
///
/// # Example
///
/// ```
/// use orderline_storage::{CacheConfig, ExpiringStore};
/// use std::time::Duration;
///
/// let store = ExpiringStore::new(CacheConfig::default());
/// store.set("order-1", 42u32, Duration::from_secs(60));
/// assert_eq!(store.get("order-1"), Some(42));
/// ```
pub struct ExpiringStore<V> {
    inner: Arc<StoreInner<V>>,
    config: CacheConfig,
    shutdown_tx: watch::Sender<bool>,
    reclaimer_started: AtomicBool,
}

impl<V> ExpiringStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create an empty store. No background task runs until
    /// `start_reclamation` is called.
    pub fn new(config: CacheConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(StoreInner::new()),
            config,
            shutdown_tx,
            reclaimer_started: AtomicBool::new(false),
        }
    }

    /// Create an empty store with the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(CacheConfig::default())
    }

    /// Get the store configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get a live value for `key`.
    ///
    /// An entry whose expiry is at or before now is reported as absent even if
    /// the sweep has not removed it yet.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let value = {
            let entries = self.inner.read();
            entries
                .get(key)
                .filter(|entry| !entry.is_expired_at(now))
                .map(|entry| entry.value().clone())
        };

        let counter = if value.is_some() {
            &self.inner.hits
        } else {
            &self.inner.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        value
    }

    /// Insert or fully replace the entry for `key`, expiring `ttl` from now.
    ///
    /// A zero `ttl` selects the configured default TTL. Very long TTLs are
    /// capped at [`MAX_CACHE_TTL`](super::config::MAX_CACHE_TTL).
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let ttl = self.config.effective_ttl(ttl);
        let now = Instant::now();
        // The capped TTL fits on every supported platform; never panic if not.
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(DEFAULT_CACHE_TTL))
            .unwrap_or(now);
        let entry = CacheEntry::new(value, expires_at);
        self.inner.write().insert(key.into(), entry);
    }

    /// Start the background reclamation task.
    ///
    /// Every `interval` the task removes all expired entries. A zero interval
    /// selects the configured default. At most one task is ever started per
    /// store: later calls, and calls made outside a Tokio runtime, return
    /// `false` without spawning anything.
    pub fn start_reclamation(&self, interval: Duration) -> bool {
        let interval = self.config.effective_interval(interval);

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                tracing::warn!("Cache reclamation requires a Tokio runtime; not started");
                return false;
            }
        };

        if self
            .reclaimer_started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Cache reclamation already running; ignoring second start");
            return false;
        }

        let inner = Arc::clone(&self.inner);
        let shutdown_rx = self.shutdown_tx.subscribe();
        handle.spawn(reclaim_task(inner, interval, shutdown_rx));
        true
    }

    /// Whether `start_reclamation` has spawned the sweep task.
    pub fn is_reclaiming(&self) -> bool {
        self.reclaimer_started.load(Ordering::Acquire)
    }

    /// Signal the reclamation task to exit at its next wake-up.
    ///
    /// Returns immediately; a sweep already in progress runs to completion.
    pub fn stop(&self) {
        self.shutdown_tx.send_replace(true);
    }

    /// Run one sweep synchronously. Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.inner.purge_expired()
    }

    /// Number of entries held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether the store holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the store counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            entry_count: self.len() as u64,
            sweeps: self.inner.sweeps.load(Ordering::Relaxed),
            reclaimed: self.inner.reclaimed.load(Ordering::Relaxed),
        }
    }
}

impl<V> Default for ExpiringStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<V> Cache<V> for ExpiringStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn get(&self, key: &str) -> Option<V> {
        ExpiringStore::get(self, key)
    }

    fn set(&self, key: &str, value: V, ttl: Duration) {
        ExpiringStore::set(self, key, value, ttl)
    }

    fn stop(&self) {
        ExpiringStore::stop(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn create_test_store() -> ExpiringStore<String> {
        ExpiringStore::new(CacheConfig::default())
    }

    #[test]
    fn test_set_and_get() {
        let store = create_test_store();
        store.set("key1", "value1".to_string(), Duration::from_secs(60));
        assert_eq!(store.get("key1"), Some("value1".to_string()));
    }

    #[test]
    fn test_get_nonexistent_key() {
        let store = create_test_store();
        assert_eq!(store.get("missing"), None);
    }

    #[test]
    fn test_overwrite_replaces_value_and_expiry() {
        let store = create_test_store();
        store.set("key1", "old".to_string(), Duration::from_millis(10));
        store.set("key1", "new".to_string(), Duration::from_secs(60));

        thread::sleep(Duration::from_millis(20));
        assert_eq!(store.get("key1"), Some("new".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_expiry_hides_entry() {
        let store = create_test_store();
        store.set("1", "order".to_string(), Duration::from_millis(20));

        thread::sleep(Duration::from_millis(5));
        assert_eq!(store.get("1"), Some("order".to_string()));

        thread::sleep(Duration::from_millis(30));
        assert_eq!(store.get("1"), None);
        // Lazy expiry does not remove the entry; only a sweep does.
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_zero_ttl_uses_default() {
        let store: ExpiringStore<String> =
            ExpiringStore::new(CacheConfig::new().with_ttl(Duration::from_millis(30)));
        store.set("k", "v".to_string(), Duration::ZERO);

        // Neither "never expires" nor "already expired".
        assert_eq!(store.get("k"), Some("v".to_string()));
        thread::sleep(Duration::from_millis(50));
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let store = create_test_store();
        store.set("k", "v".to_string(), Duration::MAX);
        store.set("k2", "v2".to_string(), Duration::from_secs(u64::MAX));

        assert_eq!(store.get("k"), Some("v".to_string()));
        assert_eq!(store.get("k2"), Some("v2".to_string()));
        assert_eq!(store.purge_expired(), 0);
    }

    #[test]
    fn test_zero_ttl_with_builtin_default_is_live() {
        let store = create_test_store();
        store.set("k", "v".to_string(), Duration::ZERO);
        assert_eq!(store.get("k"), Some("v".to_string()));
    }

    #[test]
    fn test_purge_removes_only_expired() {
        let store = create_test_store();
        store.set("short", "a".to_string(), Duration::from_millis(5));
        store.set("long", "b".to_string(), Duration::from_secs(60));

        thread::sleep(Duration::from_millis(15));
        assert_eq!(store.purge_expired(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("long"), Some("b".to_string()));

        let stats = store.stats();
        assert_eq!(stats.sweeps, 1);
        assert_eq!(stats.reclaimed, 1);
    }

    #[test]
    fn test_stats_count_hits_and_misses() {
        let store = create_test_store();
        store.set("k", "v".to_string(), Duration::from_secs(60));
        store.get("k");
        store.get("k");
        store.get("nope");

        let stats = store.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
    }

    #[test]
    fn test_start_reclamation_outside_runtime() {
        let store = create_test_store();
        assert!(!store.start_reclamation(Duration::from_millis(10)));
        assert!(!store.is_reclaiming());
    }

    #[tokio::test]
    async fn test_reclamation_sweeps_expired_entries() {
        let store = create_test_store();
        assert!(store.start_reclamation(Duration::from_millis(10)));

        store.set("1", "order".to_string(), Duration::from_millis(20));
        store.set("2", "order".to_string(), Duration::from_secs(60));

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("2"), Some("order".to_string()));
        assert!(store.stats().sweeps >= 1);

        store.stop();
    }

    #[tokio::test]
    async fn test_second_start_is_ignored() {
        let store = create_test_store();
        assert!(store.start_reclamation(Duration::from_secs(60)));
        assert!(!store.start_reclamation(Duration::from_secs(60)));
        assert!(store.is_reclaiming());
        store.stop();
    }

    #[tokio::test]
    async fn test_stop_halts_sweeps() {
        let store = create_test_store();
        store.start_reclamation(Duration::from_millis(5));
        tokio::time::sleep(Duration::from_millis(30)).await;

        store.stop();
        // Let the task observe the signal and any in-flight sweep finish.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let sweeps = store.stats().sweeps;

        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.stats().sweeps, sweeps);
    }

    #[test]
    fn test_concurrent_reads_and_writes() {
        let store = Arc::new(ExpiringStore::<Arc<(u64, u64)>>::with_defaults());
        let mut handles = vec![];

        for t in 0..8u64 {
            let store = Arc::clone(&store);
            handles.push(thread::spawn(move || {
                for i in 0..2_000u64 {
                    let key = format!("k{}", i % 16);
                    if (i + t) % 3 == 0 {
                        // Both halves carry the same number; a torn value would not.
                        store.set(key, Arc::new((i, i)), Duration::from_millis(50));
                    } else if let Some(value) = store.get(&key) {
                        assert_eq!(value.0, value.1);
                    }
                }
            }));
        }

        for handle in handles {
            handle.join().expect("worker panicked");
        }
        assert!(store.len() <= 16);
    }

    #[test]
    fn test_usable_through_trait_object() {
        let store: Arc<dyn Cache<String>> = Arc::new(create_test_store());
        store.set("k", "v".to_string(), Duration::from_secs(1));
        assert_eq!(store.get("k"), Some("v".to_string()));
        store.stop();
    }
}
