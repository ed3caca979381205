//! Main application router.

use crate::{
    controllers::{health_controller, index_controller, metrics_controller, order_controller},
    middleware::logging_middleware,
    state::AppState,
};
use axum::{middleware, Router};
use orders_config::ServerConfig;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

/// Creates the main application router.
pub fn create_router(state: AppState, server_config: &ServerConfig) -> Router {
    let mut router = Router::new()
        .merge(index_controller::router())
        .merge(order_controller::router())
        .merge(health_controller::router());

    if let Some(handle) = state.metrics.clone() {
        router = router.merge(metrics_controller::router(handle));
    }

    let router = router
        .with_state(state)
        .layer(TimeoutLayer::new(server_config.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(logging_middleware));

    info!("Router created with order lookup and health endpoints");
    router
}
