//! Prometheus scrape endpoint.

use crate::state::AppState;
use axum::{routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;

/// Creates the metrics router serving `handle`.
pub fn router(handle: PrometheusHandle) -> Router<AppState> {
    Router::new().route(
        "/metrics",
        get(move || {
            let handle = handle.clone();
            async move { handle.render() }
        }),
    )
}
