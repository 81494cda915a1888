//! PostgreSQL-backed tests for the durable order store.
//!
//! Require a reachable database configured through `ORDERLINE_DB_*`.
//! Run with: cargo test -p orderline-api --features db-tests

#![cfg(feature = "db-tests")]

use std::sync::Arc;
use std::time::Duration;

use orderline_api::{ApiResult, DbConfig, OrderService, PgOrderStore};
use orderline_storage::{ExpiringStore, OrderStore};
use orderline_test_utils::fixtures::sample_order;

async fn test_store() -> ApiResult<PgOrderStore> {
    let store = PgOrderStore::from_config(&DbConfig::from_env())?;
    store.ensure_schema().await?;
    Ok(store)
}

fn unique_uid() -> String {
    format!("test{}", uuid::Uuid::now_v7().simple())
}

#[tokio::test]
async fn test_upsert_then_get() -> ApiResult<()> {
    let store = test_store().await?;
    let uid = unique_uid();

    let mut order = sample_order(&uid);
    order.validate()?;
    store.upsert(&order).await?;

    let loaded = store.get(&uid).await?.expect("order should be stored");
    assert_eq!(loaded.order_uid, uid);
    assert_eq!(loaded.track_number, order.track_number);
    assert_eq!(loaded.data, order.data);
    Ok(())
}

#[tokio::test]
async fn test_upsert_replaces_existing() -> ApiResult<()> {
    let store = test_store().await?;
    let uid = unique_uid();

    let mut first = sample_order(&uid);
    first.validate()?;
    store.upsert(&first).await?;

    let mut second = sample_order(&uid).with_track_number("WBREPLACED");
    second.validate()?;
    store.upsert(&second).await?;

    let loaded = store.get(&uid).await?.expect("order should be stored");
    assert_eq!(loaded.track_number.as_deref(), Some("WBREPLACED"));
    Ok(())
}

#[tokio::test]
async fn test_get_missing_returns_none() -> ApiResult<()> {
    let store = test_store().await?;
    assert!(store.get(&unique_uid()).await?.is_none());
    store.health_check().await?;
    Ok(())
}

#[tokio::test]
async fn test_service_over_postgres() -> ApiResult<()> {
    let store = Arc::new(test_store().await?);
    let cache = Arc::new(ExpiringStore::with_defaults());
    let service = OrderService::with_expiring_store(store, cache, Duration::from_secs(60));
    let uid = unique_uid();

    service.write(sample_order(&uid)).await?;
    let read = service.read(&uid).await?;
    assert_eq!(read.order_uid, uid);
    assert_eq!(service.cache_stats().map(|s| s.hits), Some(1));
    Ok(())
}
