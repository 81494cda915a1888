//! Kafka message source and readiness probe.
//!
//! Joins the configured consumer group and yields message payloads. Offsets
//! are committed automatically by the client, so delivery is at-least-once.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{BaseConsumer, Consumer, StreamConsumer};
use rdkafka::message::Message;

use super::source::{MessageSource, SourceError};
use crate::config::KafkaConfig;
use crate::routes::health::BrokerProbe;

/// Consumer-group source reading one topic.
pub struct KafkaSource {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaSource {
    /// Create the consumer and subscribe to the configured topic.
    ///
    /// A fresh group starts from the latest offset.
    pub fn new(config: &KafkaConfig) -> Result<Self, SourceError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.broker_list().join(","))
            .set("group.id", &config.group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "latest")
            .create()
            .map_err(|e| SourceError::Transport(format!("Failed to create consumer: {}", e)))?;

        consumer
            .subscribe(&[config.topic.as_str()])
            .map_err(|e| SourceError::Transport(format!("Failed to subscribe: {}", e)))?;

        tracing::info!(
            brokers = %config.brokers,
            topic = %config.topic,
            group_id = %config.group_id,
            "Kafka consumer subscribed"
        );

        Ok(Self {
            consumer,
            topic: config.topic.clone(),
        })
    }
}

#[async_trait]
impl MessageSource for KafkaSource {
    fn name(&self) -> &'static str {
        "kafka"
    }

    async fn next_message(&mut self) -> Result<Option<Vec<u8>>, SourceError> {
        loop {
            let message = self
                .consumer
                .recv()
                .await
                .map_err(|e| SourceError::Transport(e.to_string()))?;

            match message.payload() {
                Some(payload) => return Ok(Some(payload.to_vec())),
                None => {
                    tracing::debug!(
                        topic = %self.topic,
                        partition = message.partition(),
                        offset = message.offset(),
                        "Skipping message without payload"
                    );
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        self.consumer.unsubscribe();
        tracing::info!(topic = %self.topic, "Kafka consumer unsubscribed");
        Ok(())
    }
}

// ============================================================================
// READINESS PROBE
// ============================================================================

/// Checks that the brokers answer a metadata request for the topic.
pub struct KafkaBrokerProbe {
    client: Arc<BaseConsumer>,
    topic: String,
    timeout: Duration,
}

impl KafkaBrokerProbe {
    pub fn new(config: &KafkaConfig, timeout: Duration) -> Result<Self, SourceError> {
        let client: BaseConsumer = ClientConfig::new()
            .set("bootstrap.servers", config.broker_list().join(","))
            .create()
            .map_err(|e| SourceError::Transport(format!("Failed to create probe client: {}", e)))?;

        Ok(Self {
            client: Arc::new(client),
            topic: config.topic.clone(),
            timeout,
        })
    }
}

#[async_trait]
impl BrokerProbe for KafkaBrokerProbe {
    async fn check(&self) -> Result<(), SourceError> {
        let client = Arc::clone(&self.client);
        let topic = self.topic.clone();
        let timeout = self.timeout;

        // fetch_metadata blocks for up to `timeout`.
        tokio::task::spawn_blocking(move || client.fetch_metadata(Some(&topic), timeout).map(|_| ()))
            .await
            .map_err(|e| SourceError::Transport(format!("Probe task failed: {}", e)))?
            .map_err(|e| SourceError::Transport(e.to_string()))
    }
}
