//! Fuzz test for order decoding and validation
//!
//! Feeds arbitrary bytes through the same path the ingestion loop uses:
//! decode, then validate. Neither step may panic.
//!
//! Run with: cargo +nightly fuzz run order_decode_fuzz -- -max_total_time=60

#![no_main]

use libfuzzer_sys::fuzz_target;
use orderline_core::Order;

fuzz_target!(|data: &[u8]| {
    let Ok(mut order) = Order::from_slice(data) else {
        return;
    };

    let was_valid = order.is_valid();
    match order.validate() {
        Ok(()) => {
            assert!(was_valid, "validate accepted an order check rejected");
            assert!(!order.order_uid.is_empty());
            assert!(order.data.is_some());
            assert!(order.created_at.is_some(), "validated order must carry a creation time");
        }
        Err(_) => assert!(!was_valid, "validate rejected an order check accepted"),
    }
});
