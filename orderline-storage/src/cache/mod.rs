//! Expiring in-memory cache.
//!
//! [`ExpiringStore`] keeps values for a bounded time. Reads never return an
//! expired value, and a background sweep (see
//! [`ExpiringStore::start_reclamation`]) removes expired entries so memory
//! does not grow with keys that are never read again.
//!
//! # Example
//!
//! ```ignore
//! let store = Arc::new(ExpiringStore::new(CacheConfig::default()));
//! store.start_reclamation(Duration::from_secs(60));
//!
//! store.set("b563feb7b2b84b6test", order, Duration::from_secs(300));
//! let hit = store.get("b563feb7b2b84b6test");
//!
//! // On shutdown
//! store.stop();
//! ```

pub mod config;
mod entry;
pub mod expiring;
mod reclaim;
pub mod traits;

pub use config::{CacheConfig, DEFAULT_CACHE_TTL, DEFAULT_SWEEP_INTERVAL, MAX_CACHE_TTL};
pub use expiring::ExpiringStore;
pub use traits::{Cache, CacheStats};
