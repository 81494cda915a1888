//! Health Check Endpoints
//!
//! - /health/ping - Simple liveness check
//! - /health/live - Process alive check
//! - /health/ready - Durable store connectivity plus cache statistics, and a
//!   broker check when ingesting from Kafka. A failed broker check is reported
//!   but does not fail readiness.

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use orderline_storage::CacheStats;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::ingest::SourceError;
use crate::state::AppState;

// ============================================================================
// BROKER CHECK
// ============================================================================

/// Connectivity check against the message broker feeding ingestion.
#[async_trait]
pub trait BrokerProbe: Send + Sync {
    async fn check(&self) -> Result<(), SourceError>;
}

// ============================================================================
// TYPES
// ============================================================================

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthDetails {
    pub service: String,
    pub database: ComponentHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheHealth>,
    pub kafka: BrokerHealth,
    pub version: String,
    pub uptime_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of the broker check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrokerStatus {
    /// No broker is in use
    Skipped,
    /// The broker answered
    Checked,
    /// The broker could not be reached
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerHealth {
    pub status: BrokerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheHealth {
    pub entries: u64,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub sweeps: u64,
    pub reclaimed: u64,
}

impl From<CacheStats> for CacheHealth {
    fn from(stats: CacheStats) -> Self {
        Self {
            entries: stats.entry_count,
            hits: stats.hits,
            misses: stats.misses,
            hit_rate: stats.hit_rate(),
            sweeps: stats.sweeps,
            reclaimed: stats.reclaimed,
        }
    }
}

// ============================================================================
// HANDLERS
// ============================================================================

/// GET /health/ping - Simple pong response
pub async fn ping() -> impl IntoResponse {
    (StatusCode::OK, "pong")
}

/// GET /health/live - Process liveness check
pub async fn liveness() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        message: Some("Process is alive".to_string()),
        details: None,
    };
    (StatusCode::OK, Json(response))
}

/// GET /health/ready - Readiness check (durable store connectivity)
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let database = match state.service.health_check().await {
        Ok(()) => ComponentHealth {
            status: HealthStatus::Healthy,
            latency_ms: Some(start.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            ComponentHealth {
                status: HealthStatus::Unhealthy,
                latency_ms: None,
                error: Some(format!("Database check failed: {}", e)),
            }
        }
    };

    let kafka = check_broker(&state).await;

    let status = database.status;
    let response = HealthResponse {
        status,
        message: None,
        details: Some(HealthDetails {
            service: state.service_name.to_string(),
            database,
            cache: state.service.cache_stats().map(CacheHealth::from),
            kafka,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.start_time.elapsed().as_secs(),
        }),
    };

    let status_code = if status == HealthStatus::Healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

async fn check_broker(state: &AppState) -> BrokerHealth {
    let Some(probe) = state.broker_probe.as_ref() else {
        return BrokerHealth {
            status: BrokerStatus::Skipped,
            error: None,
        };
    };

    match probe.check().await {
        Ok(()) => BrokerHealth {
            status: BrokerStatus::Checked,
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Readiness broker check failed");
            BrokerHealth {
                status: BrokerStatus::Unavailable,
                error: Some(e.to_string()),
            }
        }
    }
}

// ============================================================================
// ROUTER
// ============================================================================

/// Create health check router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/ping", get(ping))
        .route("/live", get(liveness))
        .route("/ready", get(readiness))
}
