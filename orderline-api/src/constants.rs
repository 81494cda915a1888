//! Constants for the Orderline API
//!
//! Default values for every setting read from the environment, kept in one
//! place so configuration and tests agree on them.

use std::net::{IpAddr, Ipv4Addr};

// ============================================================================
// SERVICE
// ============================================================================

/// Default service name reported in logs and health responses
pub const DEFAULT_SERVICE_NAME: &str = "orderline";

/// Default bind address for the HTTP server
pub const DEFAULT_BIND_ADDR: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 8081;

/// Default log level when neither `RUST_LOG` nor `ORDERLINE_LOG_LEVEL` is set
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Minimum accepted length of an order id in the lookup route
pub const MIN_ORDER_ID_LEN: usize = 6;

// ============================================================================
// CACHE
// ============================================================================

/// Default TTL for cached orders in seconds (5 minutes)
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

/// Default interval between cache sweeps in seconds (1 minute)
pub const DEFAULT_CACHE_SWEEP_INTERVAL_SECS: u64 = 60;

// ============================================================================
// DATABASE
// ============================================================================

pub const DEFAULT_DB_HOST: &str = "localhost";
pub const DEFAULT_DB_PORT: u16 = 5432;
pub const DEFAULT_DB_NAME: &str = "orders";
pub const DEFAULT_DB_USER: &str = "postgres";

/// Default maximum connection pool size
pub const DEFAULT_DB_POOL_SIZE: usize = 10;

/// Default connection wait timeout in seconds
pub const DEFAULT_DB_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// INGESTION
// ============================================================================

/// Default pause after a failed pull before trying again, in milliseconds
pub const DEFAULT_INGEST_ERROR_BACKOFF_MS: u64 = 500;

pub const DEFAULT_KAFKA_BROKERS: &str = "localhost:9092";
pub const DEFAULT_KAFKA_TOPIC: &str = "orders";
pub const DEFAULT_KAFKA_GROUP_ID: &str = "orderline-consumer";

/// Upper bound on the readiness broker check, in milliseconds
pub const KAFKA_PROBE_TIMEOUT_MS: u64 = 2000;

/// Default number of orders published by the producer binary
pub const DEFAULT_PRODUCER_COUNT: usize = 10;
