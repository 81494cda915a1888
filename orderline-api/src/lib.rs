//! Orderline API - order ingestion and lookup service
//!
//! Wires the expiring cache and a durable order store into the cache-aside
//! [`OrderService`], feeds it from a streaming source through the ingestion
//! loop, and serves lookups over HTTP (Axum).

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod ingest;
pub mod macros;
pub mod producer;
pub mod routes;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::{IngestConfig, IngestSourceKind, KafkaConfig, ServiceConfig};
pub use db::{DbConfig, PgOrderStore};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use ingest::{
    ChannelSource, IngestMetrics, IngestSnapshot, LinesSource, MessageSource, OrderConsumer,
    SourceError,
};
pub use routes::create_api_router;
pub use routes::health::{BrokerHealth, BrokerProbe, BrokerStatus};
pub use service::{OrderCache, OrderService};
pub use state::AppState;
