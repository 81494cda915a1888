//! Orderline Core - Order record and error types
//!
//! The value type moved through every layer of the service, its validation
//! rule, and the error taxonomy shared by the storage and API crates.

pub mod error;
pub mod order;

pub use error::{OrderError, OrderResult, StorageError, StorageResult, ValidationError};
pub use order::{Order, OrderData};

// ============================================================================
// PROPERTY TESTS
// ============================================================================
