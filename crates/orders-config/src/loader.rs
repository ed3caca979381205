//! Configuration loader with layered sources.

use crate::AppConfig;
use orders_core::OrdersError;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use tracing::{debug, info, warn};

/// Configuration loader with layered sources.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AppConfig,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables such as `ORDERS__CACHE__WARM_COUNT`
    pub fn new(config_dir: impl Into<String>) -> Result<Self, OrdersError> {
        let config_dir: String = config_dir.into();
        let config = Self::load_config(&config_dir)?;
        Ok(Self { config })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, OrdersError> {
        Self::new("./config")
    }

    /// Returns the loaded configuration.
    #[must_use]
    pub fn into_config(self) -> AppConfig {
        self.config
    }

    fn load_config(config_dir: &str) -> Result<AppConfig, OrdersError> {
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("ORDERS_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder();

        for name in ["default", environment.as_str(), "local"] {
            let path = format!("{}/{}.toml", config_dir, name);
            if Path::new(&path).exists() {
                debug!("Loading config from: {}", path);
                builder = builder.add_source(File::with_name(&path).required(false));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("ORDERS")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder
            .build()
            .and_then(Config::try_deserialize::<AppConfig>)
            .map_err(config_error_to_orders_error)?;

        validate_config(&app_config)?;

        Ok(app_config)
    }
}

/// Rejects configurations the service cannot run with.
pub fn validate_config(config: &AppConfig) -> Result<(), OrdersError> {
    if config.database.url.is_empty() {
        return Err(OrdersError::Configuration("Database URL is required".to_string()));
    }

    if config.feed.stream_key.is_empty() {
        return Err(OrdersError::Configuration("Feed stream key is required".to_string()));
    }

    if config.feed.batch_size == 0 {
        return Err(OrdersError::Configuration("Feed batch size must be positive".to_string()));
    }

    // XREAD BLOCK 0 waits forever.
    if config.feed.block_ms == 0 {
        return Err(OrdersError::Configuration("Feed block_ms must be positive".to_string()));
    }

    if config.cache.store_timeout_ms == 0 || config.cache.cache_timeout_ms == 0 {
        return Err(OrdersError::Configuration(
            "Store and cache call timeouts must be positive".to_string(),
        ));
    }

    if config.cache.entry_ttl_secs == 0 {
        warn!("cache.entry_ttl_secs is 0: ingested and looked-up entries will never expire");
    }

    Ok(())
}

fn config_error_to_orders_error(err: ConfigError) -> OrdersError {
    OrdersError::Configuration(err.to_string())
}
