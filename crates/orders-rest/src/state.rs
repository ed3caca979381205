//! Application state for Axum handlers.

use metrics_exporter_prometheus::PrometheusHandle;
use orders_repository::DatabasePoolInterface;
use orders_service::OrderLookup;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub lookup: Arc<dyn OrderLookup>,
    /// Checked by `/ready` when present.
    pub database: Option<Arc<dyn DatabasePoolInterface>>,
    /// Renders `/metrics` when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(lookup: Arc<dyn OrderLookup>) -> Self {
        Self {
            lookup,
            database: None,
            metrics: None,
        }
    }

    /// Attaches the record store pool for readiness checks.
    #[must_use]
    pub fn with_database(mut self, database: Arc<dyn DatabasePoolInterface>) -> Self {
        self.database = Some(database);
        self
    }

    /// Attaches the Prometheus handle.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
