//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use crate::routes::health::BrokerProbe;
use crate::service::OrderService;

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Cache-aside order service.
    pub service: OrderService,
    /// Name reported by the health endpoints.
    pub service_name: Arc<str>,
    pub start_time: Instant,
    /// Broker check for readiness; `None` when ingestion uses no broker.
    pub broker_probe: Option<Arc<dyn BrokerProbe>>,
}

impl AppState {
    pub fn new(service: OrderService, service_name: &str) -> Self {
        Self {
            service,
            service_name: Arc::from(service_name),
            start_time: Instant::now(),
            broker_probe: None,
        }
    }

    pub fn with_broker_probe(mut self, probe: Arc<dyn BrokerProbe>) -> Self {
        self.broker_probe = Some(probe);
        self
    }
}

crate::impl_from_ref!(OrderService, service);
