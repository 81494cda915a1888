//! Service Configuration Module
//!
//! Configuration is loaded from `ORDERLINE_*` environment variables with
//! defaults from [`crate::constants`]. Every `from_env` constructor has a
//! `from_lookup` twin taking the variable source as a closure, which is what
//! the tests drive.

use crate::constants::*;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

/// Reads a variable, treating an empty value as unset.
pub(crate) fn lookup_var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|v| !v.trim().is_empty())
}

/// Reads and parses a variable, falling back to `default` when the variable
/// is unset or does not parse.
pub(crate) fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup_var(lookup, key)
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

pub(crate) fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

// ============================================================================
// INGESTION CONFIGURATION
// ============================================================================

/// Where the ingestion loop reads orders from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestSourceKind {
    /// Newline-delimited JSON on standard input
    Stdin,
    /// Kafka topic (requires the `kafka` feature)
    Kafka,
    /// Ingestion disabled; the service only serves reads
    Disabled,
}

impl FromStr for IngestSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdin" => Ok(Self::Stdin),
            "kafka" => Ok(Self::Kafka),
            "none" | "off" | "disabled" => Ok(Self::Disabled),
            other => Err(format!("unknown ingest source '{}'", other)),
        }
    }
}

/// Kafka connection settings shared by the consumer and the producer binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaConfig {
    /// Comma-separated bootstrap servers
    pub brokers: String,
    pub topic: String,
    pub group_id: String,
}

impl Default for KafkaConfig {
    fn default() -> Self {
        Self {
            brokers: DEFAULT_KAFKA_BROKERS.to_string(),
            topic: DEFAULT_KAFKA_TOPIC.to_string(),
            group_id: DEFAULT_KAFKA_GROUP_ID.to_string(),
        }
    }
}

impl KafkaConfig {
    /// Create KafkaConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `ORDERLINE_KAFKA_BROKERS` (default: localhost:9092)
    /// - `ORDERLINE_KAFKA_TOPIC` (default: orders)
    /// - `ORDERLINE_KAFKA_GROUP_ID` (default: orderline-consumer)
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            brokers: lookup_var(&lookup, "ORDERLINE_KAFKA_BROKERS")
                .unwrap_or_else(|| DEFAULT_KAFKA_BROKERS.to_string()),
            topic: lookup_var(&lookup, "ORDERLINE_KAFKA_TOPIC")
                .unwrap_or_else(|| DEFAULT_KAFKA_TOPIC.to_string()),
            group_id: lookup_var(&lookup, "ORDERLINE_KAFKA_GROUP_ID")
                .unwrap_or_else(|| DEFAULT_KAFKA_GROUP_ID.to_string()),
        }
    }

    /// Broker list with blanks removed.
    pub fn broker_list(&self) -> Vec<String> {
        self.brokers
            .split(',')
            .map(|b| b.trim().to_string())
            .filter(|b| !b.is_empty())
            .collect()
    }
}

/// Ingestion loop settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    pub source: IngestSourceKind,
    /// Pause after a failed pull before trying again.
    pub error_backoff: Duration,
    pub kafka: KafkaConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            source: IngestSourceKind::Stdin,
            error_backoff: Duration::from_millis(DEFAULT_INGEST_ERROR_BACKOFF_MS),
            kafka: KafkaConfig::default(),
        }
    }
}

impl IngestConfig {
    /// Create IngestConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `ORDERLINE_INGEST_SOURCE`: stdin, kafka or none (default: stdin)
    /// - `ORDERLINE_INGEST_ERROR_BACKOFF_MS` (default: 500)
    /// - the `ORDERLINE_KAFKA_*` variables read by [`KafkaConfig`]
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = match lookup_var(&lookup, "ORDERLINE_INGEST_SOURCE") {
            Some(raw) => raw.parse::<IngestSourceKind>().unwrap_or_else(|err: String| {
                tracing::warn!(error = %err, "Falling back to stdin ingestion");
                IngestSourceKind::Stdin
            }),
            None => IngestSourceKind::Stdin,
        };

        Self {
            source,
            error_backoff: Duration::from_millis(parse_var(
                &lookup,
                "ORDERLINE_INGEST_ERROR_BACKOFF_MS",
                DEFAULT_INGEST_ERROR_BACKOFF_MS,
            )),
            kafka: KafkaConfig::from_lookup(&lookup),
        }
    }

    pub fn with_source(mut self, source: IngestSourceKind) -> Self {
        self.source = source;
        self
    }

    pub fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }
}

// ============================================================================
// SERVICE CONFIGURATION
// ============================================================================

/// Top-level service configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub service_name: String,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub log_level: String,
    /// Upper bound on the time spent serving one HTTP request.
    pub request_timeout: Duration,
    /// TTL applied to orders placed in the cache.
    pub cache_ttl: Duration,
    /// Interval between cache reclamation sweeps.
    pub cache_sweep_interval: Duration,
    pub ingest: IngestConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            bind_addr: DEFAULT_BIND_ADDR,
            port: DEFAULT_HTTP_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            cache_sweep_interval: Duration::from_secs(DEFAULT_CACHE_SWEEP_INTERVAL_SECS),
            ingest: IngestConfig::default(),
        }
    }
}

impl ServiceConfig {
    /// Create ServiceConfig from environment variables.
    ///
    /// # Environment Variables
    /// - `ORDERLINE_SERVICE_NAME` (default: orderline)
    /// - `ORDERLINE_BIND` (default: 0.0.0.0)
    /// - `ORDERLINE_PORT`, else `PORT` (default: 8081)
    /// - `ORDERLINE_LOG_LEVEL` (default: info)
    /// - `ORDERLINE_REQUEST_TIMEOUT_SECS` (default: 15)
    /// - `ORDERLINE_CACHE_TTL_SECS` (default: 300)
    /// - `ORDERLINE_CACHE_SWEEP_INTERVAL_SECS` (default: 60)
    /// - the ingestion variables read by [`IngestConfig`]
    pub fn from_env() -> Self {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup_var(&lookup, "ORDERLINE_PORT")
            .or_else(|| lookup_var(&lookup, "PORT"))
            .and_then(|s| s.trim().parse().ok())
            .unwrap_or(DEFAULT_HTTP_PORT);

        Self {
            service_name: lookup_var(&lookup, "ORDERLINE_SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            bind_addr: parse_var(&lookup, "ORDERLINE_BIND", DEFAULT_BIND_ADDR),
            port,
            log_level: lookup_var(&lookup, "ORDERLINE_LOG_LEVEL")
                .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                "ORDERLINE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            cache_ttl: Duration::from_secs(parse_var(
                &lookup,
                "ORDERLINE_CACHE_TTL_SECS",
                DEFAULT_CACHE_TTL_SECS,
            )),
            cache_sweep_interval: Duration::from_secs(parse_var(
                &lookup,
                "ORDERLINE_CACHE_SWEEP_INTERVAL_SECS",
                DEFAULT_CACHE_SWEEP_INTERVAL_SECS,
            )),
            ingest: IngestConfig::from_lookup(&lookup),
        }
    }

    /// Socket address the HTTP server binds to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServiceConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.port, 8081);
        assert_eq!(config.cache_ttl, Duration::from_secs(300));
        assert_eq!(config.cache_sweep_interval, Duration::from_secs(60));
        assert_eq!(config.ingest.error_backoff, Duration::from_millis(500));
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8081");
    }

    #[test]
    fn test_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("ORDERLINE_SERVICE_NAME", "orders-eu"),
            ("ORDERLINE_BIND", "127.0.0.1"),
            ("ORDERLINE_PORT", "9000"),
            ("ORDERLINE_CACHE_TTL_SECS", "30"),
            ("ORDERLINE_INGEST_SOURCE", "kafka"),
            ("ORDERLINE_KAFKA_TOPIC", "orders-v2"),
        ]));

        assert_eq!(config.service_name, "orders-eu");
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.ingest.source, IngestSourceKind::Kafka);
        assert_eq!(config.ingest.kafka.topic, "orders-v2");
    }

    #[test]
    fn test_port_fallback_and_bad_values() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("PORT", "7000"),
            ("ORDERLINE_REQUEST_TIMEOUT_SECS", "soon"),
            ("ORDERLINE_INGEST_SOURCE", "carrier-pigeon"),
        ]));

        assert_eq!(config.port, 7000);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.ingest.source, IngestSourceKind::Stdin);
    }

    #[test]
    fn test_ingest_source_parsing() {
        assert_eq!("STDIN".parse::<IngestSourceKind>(), Ok(IngestSourceKind::Stdin));
        assert_eq!(" kafka ".parse::<IngestSourceKind>(), Ok(IngestSourceKind::Kafka));
        assert_eq!("none".parse::<IngestSourceKind>(), Ok(IngestSourceKind::Disabled));
        assert!("file".parse::<IngestSourceKind>().is_err());
    }

    #[test]
    fn test_broker_list() {
        let kafka = KafkaConfig {
            brokers: "a:9092, b:9092,,".to_string(),
            ..Default::default()
        };
        assert_eq!(kafka.broker_list(), vec!["a:9092", "b:9092"]);
    }
}
