//! Orderline Test Utilities
//!
//! Shared test infrastructure for the Orderline workspace:
//! - A durable-store stub that counts calls and injects failures
//! - Proptest generators for orders
//! - Fixtures for common scenarios
//! - Assertions on order results

pub use orderline_core::{
    Order, OrderData, OrderError, OrderResult, StorageError, StorageResult, ValidationError,
};
pub use orderline_storage::{InMemoryOrderStore, OrderStore};

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

// ============================================================================
// COUNTING STORE
// ============================================================================

/// Durable store stub backed by [`InMemoryOrderStore`].
///
/// Every trait call is counted, and each operation can be switched to fail
/// with [`StorageError::Unavailable`]. Seeding through [`seed`](Self::seed)
/// bypasses the counters.
#[derive(Debug, Default)]
pub struct CountingOrderStore {
    inner: InMemoryOrderStore,
    get_calls: AtomicUsize,
    upsert_calls: AtomicUsize,
    health_calls: AtomicUsize,
    fail_get: AtomicBool,
    fail_upsert: AtomicBool,
    fail_health: AtomicBool,
}

impl CountingOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an order without touching the call counters.
    pub async fn seed(&self, order: &Order) {
        self.inner.upsert(order).await.expect("in-memory upsert");
    }

    /// Read the stored order without touching the call counters.
    pub async fn peek(&self, order_uid: &str) -> Option<Order> {
        self.inner.get(order_uid).await.ok().flatten()
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn reset_counts(&self) {
        self.get_calls.store(0, Ordering::SeqCst);
        self.upsert_calls.store(0, Ordering::SeqCst);
        self.health_calls.store(0, Ordering::SeqCst);
    }

    pub fn fail_gets(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_upserts(&self, fail: bool) {
        self.fail_upsert.store(fail, Ordering::SeqCst);
    }

    pub fn fail_health_checks(&self, fail: bool) {
        self.fail_health.store(fail, Ordering::SeqCst);
    }

    fn injected(flag: &AtomicBool, operation: &str) -> StorageResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StorageError::unavailable(format!("injected {} failure", operation)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl OrderStore for CountingOrderStore {
    async fn get(&self, order_uid: &str) -> StorageResult<Option<Order>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Self::injected(&self.fail_get, "get")?;
        self.inner.get(order_uid).await
    }

    async fn upsert(&self, order: &Order) -> StorageResult<()> {
        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        Self::injected(&self.fail_upsert, "upsert")?;
        self.inner.upsert(order).await
    }

    async fn health_check(&self) -> StorageResult<()> {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        Self::injected(&self.fail_health, "health check")
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for generating orders.

    use super::*;
    use proptest::prelude::*;
    use serde_json::Value;

    /// Generate an order id long enough for the HTTP lookup route.
    pub fn arb_order_uid() -> impl Strategy<Value = String> {
        "[a-z0-9]{6,32}"
    }

    /// Generate a scalar JSON value.
    pub fn arb_json_scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-zA-Z0-9 ]{0,16}".prop_map(Value::from),
            Just(Value::Null),
        ]
    }

    /// Generate an order payload with up to eight scalar fields.
    pub fn arb_order_data() -> impl Strategy<Value = OrderData> {
        prop::collection::btree_map("[a-z_]{1,12}", arb_json_scalar(), 0..8)
            .prop_map(|entries| entries.into_iter().collect())
    }

    /// Generate a valid order, with or without track number and timestamp.
    pub fn arb_valid_order() -> impl Strategy<Value = Order> {
        (
            arb_order_uid(),
            proptest::option::of("WB[A-Z]{10}"),
            proptest::option::of(1577836800i64..1893456000i64),
            arb_order_data(),
        )
            .prop_map(|(uid, track_number, created_secs, data)| Order {
                order_uid: uid,
                track_number,
                created_at: created_secs.and_then(|secs| chrono::DateTime::from_timestamp(secs, 0)),
                data: Some(data),
            })
    }

    /// Generate an order that fails validation: empty id or missing data.
    pub fn arb_invalid_order() -> impl Strategy<Value = Order> {
        prop_oneof![
            arb_order_data().prop_map(|data| Order::new("", data)),
            arb_order_uid().prop_map(|uid| Order {
                order_uid: uid,
                ..Order::default()
            }),
        ]
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built test fixtures for common testing scenarios.

    use super::*;
    use serde_json::json;

    /// A valid order with a small fixed payload.
    pub fn sample_order(order_uid: &str) -> Order {
        let data = json!({
            "entry": "WBIL",
            "customer_id": "test",
            "items": [{ "chrt_id": 9934930, "price": 453 }],
        });
        let data = match data {
            serde_json::Value::Object(map) => map,
            _ => OrderData::new(),
        };
        Order::new(order_uid, data).with_track_number("WBILMTESTTRACK")
    }

    /// A valid order serialized the way publishers send it.
    pub fn sample_payload(order_uid: &str) -> Vec<u8> {
        serde_json::to_vec(&sample_order(order_uid)).unwrap_or_default()
    }

    /// A payload that is not JSON at all.
    pub fn malformed_payload() -> Vec<u8> {
        b"{not json".to_vec()
    }

    /// A well-formed payload that fails validation (no `data`).
    pub fn invalid_payload(order_uid: &str) -> Vec<u8> {
        format!("{{\"order_uid\":\"{}\"}}", order_uid).into_bytes()
    }
}

// ============================================================================
// CUSTOM ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions on order read/write results.

    use super::*;

    /// Assert that a result is the not-found error for `order_uid`.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &OrderResult<T>, order_uid: &str) {
        match result {
            Err(OrderError::NotFound { order_uid: uid }) => {
                assert_eq!(uid, order_uid, "Wrong id in NotFound error");
            }
            other => panic!("Expected NotFound for {}, got: {:?}", order_uid, other),
        }
    }

    /// Assert that a result is a validation error.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &OrderResult<T>) {
        match result {
            Err(OrderError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert that a result is a storage error.
    #[track_caller]
    pub fn assert_storage_error<T: std::fmt::Debug>(result: &OrderResult<T>) {
        match result {
            Err(OrderError::Storage(_)) => {}
            other => panic!("Expected Storage error, got: {:?}", other),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
