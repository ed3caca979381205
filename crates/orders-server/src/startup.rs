//! Server startup utilities.

use orders_config::{AppConfig, ObservabilityConfig};
use tracing::info;

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies, with
/// debug output for the service crates and the HTTP trace layer.
pub fn init_logging(config: &ObservabilityConfig) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},orders=debug,tower_http=debug",
            config.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.is_json() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init();
    }
}

/// Prints server startup information.
pub fn print_startup_info(config: &AppConfig) {
    let separator = "=".repeat(60);
    let addr = config.server.addr();
    info!("{}", separator);
    info!("Lookup:    http://{}/order/{{order_uid}}", addr);
    info!("Health:    http://{}/health", addr);
    if config.observability.metrics_enabled {
        info!("Metrics:   http://{}/metrics", addr);
    }
    info!("Feed:      stream '{}' from {}", config.feed.stream_key, config.feed.start_from);
    info!("{}", separator);
}
