//! Sample order generation for the producer binary and tests.

use chrono::Utc;
use orderline_core::{Order, OrderData};
use rand::Rng;
use serde_json::json;
use uuid::Uuid;

const NAMES: &[&str] = &[
    "Test Testov",
    "Ada Lovelace",
    "Grace Hopper",
    "Alan Turing",
    "Edsger Dijkstra",
];

const CITIES: &[&str] = &["Kiryat Mozkin", "Moscow", "Lisbon", "Tbilisi", "Almaty"];

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &[&'a str]) -> &'a str {
    items[rng.random_range(0..items.len())]
}

fn track_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..10)
        .map(|_| char::from(b'A' + rng.random_range(0..26u8)))
        .collect();
    format!("WB{}", suffix)
}

/// Generate a valid order with a fresh UUIDv7 id and random payload.
pub fn generate_order<R: Rng + ?Sized>(rng: &mut R) -> Order {
    let price = (rng.random_range(10.0..1000.0_f64) * 100.0).round() / 100.0;
    let data = json!({
        "customer_id": Uuid::now_v7().to_string(),
        "name": pick(rng, NAMES),
        "address": format!("{} {}", rng.random_range(1..200u32), pick(rng, CITIES)),
        "price": price,
    });

    let data: OrderData = match data {
        serde_json::Value::Object(map) => map,
        _ => OrderData::new(),
    };

    Order::new(Uuid::now_v7().simple().to_string(), data)
        .with_track_number(track_number(rng))
        .with_created_at(Utc::now())
}
