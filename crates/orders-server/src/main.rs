//! # Orders Server
//!
//! Main entry point for the order lookup service.
//!
//! Startup order: connect the record store and distributed cache, start the
//! ingestion task, warm both caches, then accept lookup traffic.

use metrics_exporter_prometheus::PrometheusBuilder;
use orders_config::{AppConfig, ConfigLoader, ObservabilityConfig};
use orders_core::{OrdersError, OrdersResult};
use orders_repository::DatabasePoolInterface;
use orders_rest::{create_router, AppState};
use orders_server::{di, startup};
use orders_service::{metrics::register_metrics, RedisStreamFeed};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            startup::init_logging(&ObservabilityConfig::default());
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    startup::init_logging(&config.observability);

    info!("Starting {}...", config.app.name);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.app.environment);

    if let Err(e) = run(config).await {
        error!("Application error: {}", e);
        std::process::exit(1);
    }
}

fn load_config() -> OrdersResult<AppConfig> {
    Ok(ConfigLoader::from_default_location()?.into_config())
}

async fn run(config: AppConfig) -> OrdersResult<()> {
    let infrastructure = di::connect_infrastructure(&config).await?;
    let module = di::build_module(&config, &infrastructure);

    let metrics_handle = if config.observability.metrics_enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| {
                OrdersError::internal(format!("Failed to install metrics recorder: {}", e))
            })?;
        register_metrics();
        Some(handle)
    } else {
        None
    };

    // The feed is positioned and ingestion spawned before warming begins.
    let mut feed = RedisStreamFeed::from_url(di::feed_url(&config), &config.feed)?;
    if let Err(e) = feed.ensure_positioned().await {
        warn!(error = %e, "Order feed not positioned yet; ingestion will retry");
    }
    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let pipeline = module.pipeline();
    let shutdown_rx = shutdown_tx.subscribe();
    let ingestion = tokio::spawn(async move { pipeline.run(feed, shutdown_rx).await });

    if let Err(e) = module.warmer().warm(config.cache.warm_count).await {
        warn!(error = %e, "Cache warming aborted; lookups will read through until caches refill");
    }

    let database: Arc<dyn DatabasePoolInterface> = infrastructure.database.clone();
    let mut app_state = AppState::new(module.lookup()).with_database(database);
    if let Some(handle) = metrics_handle {
        app_state = app_state.with_metrics(handle);
    }
    let router = create_router(app_state, &config.server);

    let addr = config.server.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| OrdersError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    startup::print_startup_info(&config);
    info!("Starting REST server on http://{}", addr);

    let served = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| OrdersError::internal(format!("REST server error: {}", e)));

    info!("Stopping ingestion...");
    let _ = shutdown_tx.send(());
    if let Err(e) = ingestion.await {
        error!(error = %e, "Ingestion task ended abnormally");
    }

    infrastructure.database.close().await;

    served?;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        }
    }
}
