//! Background reclamation of expired cache entries.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};

use super::expiring::StoreInner;

/// Periodically remove expired entries until shutdown is signalled.
///
/// The task exits when `true` is published on the shutdown channel or when
/// the sending side (owned by the store) is dropped. A sweep that has already
/// begun always runs to completion first.
pub(crate) async fn reclaim_task<V>(
    inner: Arc<StoreInner<V>>,
    sweep_interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) where
    V: Send + Sync + 'static,
{
    if *shutdown_rx.borrow() {
        tracing::debug!("Cache reclamation stopped before first sweep");
        return;
    }

    let mut ticker = interval(sweep_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately; sweeps start one interval in.
    ticker.tick().await;

    tracing::info!(
        sweep_interval_ms = sweep_interval.as_millis() as u64,
        "Cache reclamation task started"
    );

    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    tracing::info!("Cache reclamation task shutting down");
                    break;
                }
            }

            _ = ticker.tick() => {
                let removed = inner.purge_expired();
                if removed > 0 {
                    tracing::debug!(removed, "Reclaimed expired cache entries");
                }
            }
        }
    }
}
