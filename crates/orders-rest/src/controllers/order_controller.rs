//! Order lookup controller.

use crate::{responses::AppError, state::AppState};
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use orders_core::OrdersError;
use tracing::debug;

/// Creates the order router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order/:order_uid", get(get_order))
        .route("/order", get(missing_order_uid))
        .route("/order/", get(missing_order_uid))
}

/// Get an order by identifier.
///
/// Responds with the order record as stored, or 404 when no tier has it.
async fn get_order(
    State(state): State<AppState>,
    Path(order_uid): Path<String>,
) -> Result<Response, AppError> {
    debug!("Get order request: {}", order_uid);

    if order_uid.trim().is_empty() {
        return Err(missing_uid().into());
    }

    let order = state
        .lookup
        .find_order(&order_uid)
        .await
        .ok_or_else(|| OrdersError::not_found("Order", &order_uid))?;

    Ok(Json(order.as_ref()).into_response())
}

async fn missing_order_uid() -> AppError {
    missing_uid().into()
}

fn missing_uid() -> OrdersError {
    OrdersError::validation("order_uid must not be empty")
}
