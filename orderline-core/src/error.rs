//! Error types for Orderline operations

use thiserror::Error;

/// Validation errors raised before a record is allowed into storage or cache.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredFieldMissing { field: String },

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    pub fn missing(field: &str) -> Self {
        Self::RequiredFieldMissing {
            field: field.to_string(),
        }
    }
}

/// Durable storage errors.
///
/// Every variant is treated as transient by callers: the failed operation is
/// reported, never retried internally.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable: {reason}")]
    Unavailable { reason: String },

    #[error("Query failed: {reason}")]
    QueryFailed { reason: String },

    #[error("Stored record could not be decoded: {reason}")]
    Serialization { reason: String },
}

impl StorageError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn query_failed(reason: impl Into<String>) -> Self {
        Self::QueryFailed {
            reason: reason.into(),
        }
    }
}

/// Master error type for the order read and write paths.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Order not found: {order_uid}")]
    NotFound { order_uid: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl OrderError {
    pub fn not_found(order_uid: impl Into<String>) -> Self {
        Self::NotFound {
            order_uid: order_uid.into(),
        }
    }

    /// Whether this error is the clean "no such order" signal.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias for order operations.
pub type OrderResult<T> = Result<T, OrderError>;

/// Result type alias for durable storage calls.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// TESTS
// =============================================================================
