//! Order ingestion loop.
//!
//! Pulls serialized orders from a [`MessageSource`] and hands each one to
//! [`OrderService::write`]. A bad message never stops the loop: decode
//! failures, invalid orders and failed writes are logged, counted and
//! skipped. The loop stops when shutdown is signalled, when the source
//! reports cancellation, or when the source runs dry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use orderline_core::{Order, OrderError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::source::{MessageSource, SourceError};
use crate::config::IngestConfig;
use crate::service::OrderService;

// ============================================================================
// METRICS
// ============================================================================

/// Counters for ingestion activity.
#[derive(Debug, Default)]
pub struct IngestMetrics {
    /// Messages pulled from the source
    pub received: AtomicU64,
    /// Orders durably stored and cached
    pub stored: AtomicU64,
    /// Payloads that were not a decodable order
    pub decode_failures: AtomicU64,
    /// Decoded orders rejected by validation
    pub invalid: AtomicU64,
    /// Valid orders whose write failed
    pub write_failures: AtomicU64,
    /// Failed pulls (excluding cancellation)
    pub pull_errors: AtomicU64,
}

impl IngestMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current snapshot of all counters.
    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            received: self.received.load(Ordering::Relaxed),
            stored: self.stored.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            invalid: self.invalid.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
            pull_errors: self.pull_errors.load(Ordering::Relaxed),
        }
    }

    fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of ingestion counters at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestSnapshot {
    pub received: u64,
    pub stored: u64,
    pub decode_failures: u64,
    pub invalid: u64,
    pub write_failures: u64,
    pub pull_errors: u64,
}

// ============================================================================
// CONSUMER
// ============================================================================

/// Drives the ingestion loop for one source.
#[derive(Clone)]
pub struct OrderConsumer {
    service: OrderService,
    error_backoff: Duration,
}

impl OrderConsumer {
    pub fn new(service: OrderService, config: &IngestConfig) -> Self {
        Self {
            service,
            error_backoff: config.error_backoff,
        }
    }

    /// Run the loop on a background task, taking ownership of the source.
    pub fn spawn(
        self,
        mut source: Box<dyn MessageSource>,
        shutdown_rx: watch::Receiver<bool>,
    ) -> JoinHandle<Arc<IngestMetrics>> {
        tokio::spawn(async move { self.run(source.as_mut(), shutdown_rx).await })
    }

    /// Run the loop until shutdown, cancellation or end of stream.
    ///
    /// The source is closed before returning. The returned metrics cover the
    /// whole run.
    pub async fn run<S>(
        &self,
        source: &mut S,
        mut shutdown_rx: watch::Receiver<bool>,
    ) -> Arc<IngestMetrics>
    where
        S: MessageSource + ?Sized,
    {
        let metrics = Arc::new(IngestMetrics::new());

        tracing::info!(
            source = source.name(),
            error_backoff_ms = self.error_backoff.as_millis() as u64,
            "Order ingestion started"
        );

        loop {
            if *shutdown_rx.borrow() {
                tracing::info!("Order ingestion shutting down");
                break;
            }

            let pulled = tokio::select! {
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        tracing::info!("Order ingestion shutting down");
                        break;
                    }
                    continue;
                }
                pulled = source.next_message() => pulled,
            };

            match pulled {
                Ok(Some(payload)) => self.handle(&payload, &metrics).await,
                Ok(None) => {
                    tracing::info!("Message source exhausted");
                    break;
                }
                Err(SourceError::Cancelled) => {
                    tracing::info!("Message source cancelled");
                    break;
                }
                Err(err) => {
                    IngestMetrics::incr(&metrics.pull_errors);
                    tracing::error!(error = %err, "Failed to pull message");
                    if self.back_off(&mut shutdown_rx).await {
                        tracing::info!("Order ingestion shutting down");
                        break;
                    }
                }
            }
        }

        if let Err(err) = source.close().await {
            tracing::warn!(error = %err, "Failed to close message source");
        }

        let snapshot = metrics.snapshot();
        tracing::info!(
            received = snapshot.received,
            stored = snapshot.stored,
            decode_failures = snapshot.decode_failures,
            invalid = snapshot.invalid,
            write_failures = snapshot.write_failures,
            pull_errors = snapshot.pull_errors,
            "Order ingestion stopped"
        );

        metrics
    }

    /// Decode, validate and write one payload.
    async fn handle(&self, payload: &[u8], metrics: &IngestMetrics) {
        IngestMetrics::incr(&metrics.received);

        let mut order = match Order::from_slice(payload) {
            Ok(order) => order,
            Err(err) => {
                IngestMetrics::incr(&metrics.decode_failures);
                tracing::warn!(error = %err, bytes = payload.len(), "Skipping undecodable message");
                return;
            }
        };

        if let Err(err) = order.validate() {
            IngestMetrics::incr(&metrics.invalid);
            tracing::warn!(error = %err, order_uid = %order.order_uid, "Skipping invalid order");
            return;
        }

        let order_uid = order.order_uid.clone();
        match self.service.write(order).await {
            Ok(()) => {
                IngestMetrics::incr(&metrics.stored);
                tracing::debug!(order_uid = %order_uid, "Stored order");
            }
            Err(OrderError::Validation(err)) => {
                IngestMetrics::incr(&metrics.invalid);
                tracing::warn!(error = %err, order_uid = %order_uid, "Skipping invalid order");
            }
            Err(err) => {
                IngestMetrics::incr(&metrics.write_failures);
                tracing::error!(error = %err, order_uid = %order_uid, "Failed to store order");
            }
        }
    }

    /// Wait out the error back-off. Returns `true` if shutdown arrived first.
    async fn back_off(&self, shutdown_rx: &mut watch::Receiver<bool>) -> bool {
        tokio::select! {
            changed = shutdown_rx.changed() => changed.is_err() || *shutdown_rx.borrow(),
            _ = tokio::time::sleep(self.error_backoff) => false,
        }
    }
}
