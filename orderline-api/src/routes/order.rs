//! Order lookup endpoint.

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use orderline_core::Order;
use std::sync::Arc;

use crate::constants::MIN_ORDER_ID_LEN;
use crate::error::{ApiError, ApiResult};
use crate::service::OrderService;
use crate::state::AppState;

/// GET /order/:id - Fetch one order, from cache when possible.
///
/// Ids shorter than six bytes are rejected before any lookup.
pub async fn get_order(
    State(service): State<OrderService>,
    Path(id): Path<String>,
) -> ApiResult<Json<Arc<Order>>> {
    if id.len() < MIN_ORDER_ID_LEN {
        return Err(ApiError::invalid_input("Bad order id").with_details(serde_json::json!({
            "field": "id",
            "min_length": MIN_ORDER_ID_LEN,
        })));
    }

    let order = service.read(&id).await?;
    Ok(Json(order))
}

pub fn create_router() -> Router<AppState> {
    Router::new().route("/:id", get(get_order))
}
