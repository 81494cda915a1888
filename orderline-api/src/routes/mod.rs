//! REST Routes
//!
//! - `/order/:id` - order lookup
//! - `/health/*` - health checks
//!
//! Every request is traced and bounded by the configured request timeout.

use axum::Router;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::state::AppState;

pub mod health;
pub mod order;

/// Build the full HTTP router.
pub fn create_api_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .nest("/order", order::create_router())
        .nest("/health", health::create_router())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
