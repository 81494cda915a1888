//! PostgreSQL Order Store
//!
//! Connection pooling with deadpool-postgres and the [`OrderStore`]
//! implementation backed by the `orders` table. Records are stored with their
//! opaque payload in a `jsonb` column.

use crate::config::{env_lookup, lookup_var, parse_var};
use crate::constants::*;
use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolConfig, RecyclingMethod, Runtime};
use orderline_core::{Order, StorageError, StorageResult};
use orderline_storage::OrderStore;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tokio_postgres::types::Json;
use tokio_postgres::{NoTls, Row};

const CREATE_ORDERS_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS orders (
    order_uid    TEXT PRIMARY KEY,
    track_number TEXT,
    created_at   TIMESTAMPTZ NOT NULL,
    data         JSONB NOT NULL
)";

const SELECT_ORDER: &str =
    "SELECT order_uid, track_number, created_at, data FROM orders WHERE order_uid = $1";

const UPSERT_ORDER: &str = "\
INSERT INTO orders (order_uid, track_number, created_at, data)
VALUES ($1, $2, $3, $4)
ON CONFLICT (order_uid) DO UPDATE
SET track_number = EXCLUDED.track_number,
    created_at = EXCLUDED.created_at,
    data = EXCLUDED.data";

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// How long to wait for a pooled connection
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_DB_HOST.to_string(),
            port: DEFAULT_DB_PORT,
            dbname: DEFAULT_DB_NAME.to_string(),
            user: DEFAULT_DB_USER.to_string(),
            password: String::new(),
            max_size: DEFAULT_DB_POOL_SIZE,
            timeout: Duration::from_secs(DEFAULT_DB_TIMEOUT_SECS),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from `ORDERLINE_DB_*` variables.
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            host: lookup_var(&lookup, "ORDERLINE_DB_HOST")
                .unwrap_or_else(|| DEFAULT_DB_HOST.to_string()),
            port: parse_var(&lookup, "ORDERLINE_DB_PORT", DEFAULT_DB_PORT),
            dbname: lookup_var(&lookup, "ORDERLINE_DB_NAME")
                .unwrap_or_else(|| DEFAULT_DB_NAME.to_string()),
            user: lookup_var(&lookup, "ORDERLINE_DB_USER")
                .unwrap_or_else(|| DEFAULT_DB_USER.to_string()),
            password: lookup("ORDERLINE_DB_PASSWORD").unwrap_or_default(),
            max_size: parse_var(&lookup, "ORDERLINE_DB_POOL_SIZE", DEFAULT_DB_POOL_SIZE),
            timeout: Duration::from_secs(parse_var(
                &lookup,
                "ORDERLINE_DB_TIMEOUT",
                DEFAULT_DB_TIMEOUT_SECS,
            )),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened here; the first checkout connects.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// ORDER STORE
// ============================================================================

/// Durable order store on PostgreSQL.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: Pool,
}

impl PgOrderStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a store from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Create the `orders` table if it does not exist.
    pub async fn ensure_schema(&self) -> StorageResult<()> {
        let conn = self.get_conn().await?;
        conn.batch_execute(CREATE_ORDERS_TABLE)
            .await
            .map_err(query_error)?;
        tracing::debug!("Orders table ready");
        Ok(())
    }

    async fn get_conn(&self) -> StorageResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to acquire database connection");
            StorageError::unavailable(e.to_string())
        })
    }
}

fn query_error(err: tokio_postgres::Error) -> StorageError {
    StorageError::query_failed(err.to_string())
}

/// Decode one `orders` row.
fn order_from_row(row: &Row) -> StorageResult<Order> {
    let order_uid: String = row.try_get(0).map_err(query_error)?;
    let track_number: Option<String> = row.try_get(1).map_err(query_error)?;
    let created_at: DateTime<Utc> = row.try_get(2).map_err(query_error)?;
    let data: JsonValue = row.try_get(3).map_err(query_error)?;

    let data = match data {
        JsonValue::Object(map) => map,
        other => {
            return Err(StorageError::Serialization {
                reason: format!("order {} has non-object data: {}", order_uid, other),
            })
        }
    };

    Ok(Order {
        order_uid,
        track_number,
        created_at: Some(created_at),
        data: Some(data),
    })
}

#[async_trait]
impl OrderStore for PgOrderStore {
    async fn get(&self, order_uid: &str) -> StorageResult<Option<Order>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(SELECT_ORDER, &[&order_uid])
            .await
            .map_err(query_error)?;

        row.as_ref().map(order_from_row).transpose()
    }

    async fn upsert(&self, order: &Order) -> StorageResult<()> {
        let data = order.data.as_ref().ok_or_else(|| StorageError::Serialization {
            reason: format!("order {} has no data", order.order_uid),
        })?;
        let created_at = order.created_at.unwrap_or_else(Utc::now);

        let conn = self.get_conn().await?;
        conn.execute(
            UPSERT_ORDER,
            &[
                &order.order_uid,
                &order.track_number,
                &created_at,
                &Json(data),
            ],
        )
        .await
        .map_err(query_error)?;

        Ok(())
    }

    /// Health check - verifies database connectivity.
    async fn health_check(&self) -> StorageResult<()> {
        let conn = self.get_conn().await?;
        conn.query_one("SELECT 1", &[]).await.map_err(query_error)?;
        Ok(())
    }
}
