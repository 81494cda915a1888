//! Order Ingestion
//!
//! Background loop that moves orders from a streaming source into the
//! [`OrderService`](crate::service::OrderService) write path.
//!
//! # Usage
//!
//! ```ignore
//! let (shutdown_tx, shutdown_rx) = watch::channel(false);
//! let consumer = OrderConsumer::new(service.clone(), &config.ingest);
//! let handle = consumer.spawn(Box::new(LinesSource::stdin()), shutdown_rx);
//!
//! // On shutdown
//! let _ = shutdown_tx.send(true);
//! let metrics = handle.await?;
//! ```

pub mod consumer;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod source;

pub use consumer::{IngestMetrics, IngestSnapshot, OrderConsumer};
#[cfg(feature = "kafka")]
pub use kafka::{KafkaBrokerProbe, KafkaSource};
pub use source::{ChannelItem, ChannelSource, LinesSource, MessageSource, SourceError};
