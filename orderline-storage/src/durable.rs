//! Durable order store contract and an in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use orderline_core::{Order, StorageResult};
use tokio::sync::RwLock;

/// Durable record store used behind the cache.
///
/// This trait abstracts over the actual storage backend so the orchestration
/// layer can run against PostgreSQL in production and a stub in tests.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Fetch an order by id. A missing order is `Ok(None)`, not an error.
    async fn get(&self, order_uid: &str) -> StorageResult<Option<Order>>;

    /// Insert the order or replace the existing record with the same id.
    async fn upsert(&self, order: &Order) -> StorageResult<()>;

    /// Check that the backend is reachable.
    async fn health_check(&self) -> StorageResult<()>;
}

/// Process-local durable store. Useful for tests and for running the service
/// without a database.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    orders: RwLock<HashMap<String, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, order_uid: &str) -> StorageResult<Option<Order>> {
        Ok(self.orders.read().await.get(order_uid).cloned())
    }

    async fn upsert(&self, order: &Order) -> StorageResult<()> {
        self.orders
            .write()
            .await
            .insert(order.order_uid.clone(), order.clone());
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<()> {
        Ok(())
    }
}
