use criterion::{criterion_group, criterion_main, Criterion};
use orderline_core::Order;
use orderline_storage::{CacheConfig, ExpiringStore};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

fn sample_order(i: usize) -> Arc<Order> {
    let data = serde_json::json!({
        "track_number": "WBILMTESTTRACK",
        "entry": "WBIL",
        "items": [{ "chrt_id": i, "price": 453, "name": "Mascaras" }],
    });
    let data = data.as_object().cloned().unwrap_or_default();
    Arc::new(Order::new(format!("order-{i:06}"), data))
}

fn populated_store(keys: usize) -> ExpiringStore<Arc<Order>> {
    let store = ExpiringStore::new(CacheConfig::default());
    for i in 0..keys {
        store.set(format!("order-{i:06}"), sample_order(i), Duration::from_secs(300));
    }
    store
}

fn bench_get_hit(c: &mut Criterion) {
    let store = populated_store(10_000);

    c.bench_function("store/get_hit", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let key = format!("order-{:06}", i % 10_000);
            i += 1;
            black_box(store.get(black_box(&key)));
        });
    });
}

fn bench_get_miss(c: &mut Criterion) {
    let store = populated_store(10_000);

    c.bench_function("store/get_miss", |b| {
        b.iter(|| black_box(store.get(black_box("order-missing"))));
    });
}

fn bench_set_replace(c: &mut Criterion) {
    let store = populated_store(1_000);
    let order = sample_order(0);

    c.bench_function("store/set_replace", |b| {
        let mut i = 0usize;
        b.iter(|| {
            let key = format!("order-{:06}", i % 1_000);
            i += 1;
            store.set(key, Arc::clone(&order), Duration::from_secs(300));
        });
    });
}

fn bench_purge_live(c: &mut Criterion) {
    let store = populated_store(10_000);

    c.bench_function("store/purge_10k_live", |b| {
        b.iter(|| black_box(store.purge_expired()));
    });
}

criterion_group!(
    benches,
    bench_get_hit,
    bench_get_miss,
    bench_set_replace,
    bench_purge_live
);
criterion_main!(benches);
