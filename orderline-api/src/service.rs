//! Order Service
//!
//! Cache-aside reads and write-through writes over a durable [`OrderStore`]
//! and an expiring [`Cache`]. This is the only component that decides when a
//! lookup is answered from memory and when it goes to storage.
//!
//! - `read`: cache hit returns without storage I/O. A miss loads from storage
//!   and populates the cache. A missing order is never cached.
//! - `write`: validation first, then the durable upsert, and only after that
//!   succeeds the cache entry is replaced. A failed upsert leaves the cache
//!   exactly as it was.

use std::sync::Arc;
use std::time::Duration;

use orderline_core::{Order, OrderError, OrderResult, StorageResult};
use orderline_storage::{Cache, CacheStats, ExpiringStore, OrderStore};

/// Cache of shared, immutable orders keyed by `order_uid`.
pub type OrderCache = dyn Cache<Arc<Order>>;

/// Orchestrates the cache and the durable store.
#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn OrderStore>,
    cache: Arc<OrderCache>,
    /// Concrete store handle kept for statistics, when the cache is one.
    stats_source: Option<Arc<ExpiringStore<Arc<Order>>>>,
    cache_ttl: Duration,
}

impl OrderService {
    /// Create a service over any cache implementation.
    ///
    /// A zero `cache_ttl` defers to the cache's own default TTL.
    pub fn new(store: Arc<dyn OrderStore>, cache: Arc<OrderCache>, cache_ttl: Duration) -> Self {
        Self {
            store,
            cache,
            stats_source: None,
            cache_ttl,
        }
    }

    /// Create a service over an [`ExpiringStore`], exposing its statistics
    /// through [`cache_stats`](Self::cache_stats).
    pub fn with_expiring_store(
        store: Arc<dyn OrderStore>,
        cache: Arc<ExpiringStore<Arc<Order>>>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache: cache.clone(),
            stats_source: Some(cache),
            cache_ttl,
        }
    }

    /// TTL applied to orders placed in the cache.
    pub fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Look up an order, cache first.
    ///
    /// # Errors
    /// - [`OrderError::NotFound`] when the durable store has no such order.
    /// - [`OrderError::Storage`] when the durable lookup fails; the cache is
    ///   left untouched.
    pub async fn read(&self, order_uid: &str) -> OrderResult<Arc<Order>> {
        if let Some(order) = self.cache.get(order_uid) {
            tracing::debug!(order_uid, "Order served from cache");
            return Ok(order);
        }

        let order = match self.store.get(order_uid).await? {
            Some(order) => Arc::new(order),
            None => return Err(OrderError::not_found(order_uid)),
        };

        self.cache.set(order_uid, Arc::clone(&order), self.cache_ttl);
        tracing::debug!(order_uid, "Order loaded from storage and cached");

        Ok(order)
    }

    /// Validate and persist an order, then refresh its cache entry.
    ///
    /// # Errors
    /// - [`OrderError::Validation`] before any storage or cache access.
    /// - [`OrderError::Storage`] when the upsert fails; the cache is unchanged.
    pub async fn write(&self, mut order: Order) -> OrderResult<()> {
        order.validate()?;

        self.store.upsert(&order).await?;

        let order_uid = order.order_uid.clone();
        self.cache.set(&order_uid, Arc::new(order), self.cache_ttl);
        tracing::debug!(order_uid = %order_uid, "Order stored");

        Ok(())
    }

    /// Check durable store connectivity.
    pub async fn health_check(&self) -> StorageResult<()> {
        self.store.health_check().await
    }

    /// Cache statistics, when the cache is an [`ExpiringStore`].
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.stats_source.as_ref().map(|store| store.stats())
    }

    /// Stop background cache maintenance.
    pub fn shutdown(&self) {
        self.cache.stop();
    }
}
