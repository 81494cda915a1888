//! Orderline Server Entry Point
//!
//! Bootstraps configuration and telemetry, prepares the durable store and the
//! cache, starts the ingestion loop and serves HTTP until SIGINT/SIGTERM.

use std::sync::Arc;

use orderline_api::telemetry::init_tracing;
use orderline_api::{
    create_api_router, ApiError, ApiResult, AppState, BrokerProbe, DbConfig, IngestConfig,
    IngestSourceKind, LinesSource, MessageSource, OrderConsumer, OrderService, PgOrderStore,
    ServiceConfig,
};
use orderline_storage::{CacheConfig, ExpiringStore};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> ApiResult<()> {
    let config = ServiceConfig::from_env();
    init_tracing(&config)?;

    let db_config = DbConfig::from_env();
    let store = PgOrderStore::from_config(&db_config)?;
    store.ensure_schema().await?;
    tracing::info!(
        host = %db_config.host,
        dbname = %db_config.dbname,
        max_size = db_config.max_size,
        "Database ready"
    );

    let cache = Arc::new(ExpiringStore::new(
        CacheConfig::new()
            .with_ttl(config.cache_ttl)
            .with_sweep_interval(config.cache_sweep_interval),
    ));
    cache.start_reclamation(config.cache_sweep_interval);

    let service = OrderService::with_expiring_store(Arc::new(store), cache, config.cache_ttl);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let ingest_handle = match build_source(&config.ingest)? {
        Some(source) => {
            let consumer = OrderConsumer::new(service.clone(), &config.ingest);
            Some(consumer.spawn(source, shutdown_rx))
        }
        None => {
            tracing::info!("Ingestion disabled");
            None
        }
    };

    let mut state = AppState::new(service.clone(), &config.service_name);
    if let Some(probe) = broker_probe(&config.ingest) {
        state = state.with_broker_probe(probe);
    }
    let app = create_api_router(state, config.request_timeout);

    let addr = config.socket_addr();
    tracing::info!(%addr, service_name = %config.service_name, "Starting Orderline server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    shutdown_tx.send_replace(true);
    if let Some(handle) = ingest_handle {
        match handle.await {
            Ok(metrics) => {
                let snapshot = metrics.snapshot();
                tracing::info!(stored = snapshot.stored, "Ingestion finished");
            }
            Err(e) => tracing::error!(error = %e, "Ingestion task failed"),
        }
    }
    service.shutdown();

    served.map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;
    tracing::info!("Graceful shutdown complete");
    Ok(())
}

fn build_source(config: &IngestConfig) -> ApiResult<Option<Box<dyn MessageSource>>> {
    match config.source {
        IngestSourceKind::Stdin => Ok(Some(Box::new(LinesSource::stdin()))),
        IngestSourceKind::Disabled => Ok(None),
        IngestSourceKind::Kafka => kafka_source(config),
    }
}

#[cfg(feature = "kafka")]
fn kafka_source(config: &IngestConfig) -> ApiResult<Option<Box<dyn MessageSource>>> {
    let source = orderline_api::ingest::KafkaSource::new(&config.kafka)
        .map_err(|e| ApiError::service_unavailable(e.to_string()))?;
    Ok(Some(Box::new(source)))
}

#[cfg(not(feature = "kafka"))]
fn kafka_source(_config: &IngestConfig) -> ApiResult<Option<Box<dyn MessageSource>>> {
    Err(ApiError::invalid_input(
        "Kafka ingestion requested but this build lacks the `kafka` feature",
    ))
}

#[cfg(feature = "kafka")]
fn broker_probe(config: &IngestConfig) -> Option<Arc<dyn BrokerProbe>> {
    use orderline_api::constants::KAFKA_PROBE_TIMEOUT_MS;
    use orderline_api::ingest::KafkaBrokerProbe;
    use std::time::Duration;

    if config.source != IngestSourceKind::Kafka {
        return None;
    }
    match KafkaBrokerProbe::new(&config.kafka, Duration::from_millis(KAFKA_PROBE_TIMEOUT_MS)) {
        Ok(probe) => Some(Arc::new(probe)),
        Err(e) => {
            tracing::warn!(error = %e, "Readiness will skip the broker check");
            None
        }
    }
}

// Without the feature there is no broker to check.
#[cfg(not(feature = "kafka"))]
fn broker_probe(_config: &IngestConfig) -> Option<Arc<dyn BrokerProbe>> {
    None
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
