//! Component wiring.
//!
//! Every component is constructed here and handed its collaborators as
//! `Arc`s. The warmer, the ingestion pipeline and the lookup service share a
//! single [`LocalCache`] and a single distributed cache client; they never
//! call one another.

use orders_config::AppConfig;
use orders_core::OrdersResult;
use orders_repository::{
    create_pool, DatabasePool, DatabasePoolInterface, OrderRepository, PostgresOrderRepository,
};
use orders_service::{
    create_redis_pool, CacheWarmer, CachePolicy, DistributedCache, IngestionPipeline, LocalCache,
    OrderLookup, OrderLookupService, RedisCacheService,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// The assembled service components.
pub struct AppModule {
    local: Arc<LocalCache>,
    lookup: Arc<OrderLookupService>,
    pipeline: Arc<IngestionPipeline>,
    warmer: Arc<CacheWarmer>,
}

impl AppModule {
    /// Wires the components over an already-connected store and cache.
    pub fn assemble(
        repository: Arc<dyn OrderRepository>,
        distributed: Arc<dyn DistributedCache>,
        policy: CachePolicy,
        feed_error_backoff: Duration,
    ) -> Self {
        let local = Arc::new(LocalCache::new());

        let lookup = Arc::new(OrderLookupService::new(
            Arc::clone(&local),
            Arc::clone(&distributed),
            Arc::clone(&repository),
            policy,
        ));
        let pipeline = Arc::new(
            IngestionPipeline::new(
                Arc::clone(&local),
                Arc::clone(&distributed),
                Arc::clone(&repository),
                policy,
            )
            .with_error_backoff(feed_error_backoff),
        );
        let warmer = Arc::new(CacheWarmer::new(
            Arc::clone(&local),
            distributed,
            repository,
            policy,
        ));

        Self {
            local,
            lookup,
            pipeline,
            warmer,
        }
    }

    /// Returns the shared local cache.
    pub fn local_cache(&self) -> Arc<LocalCache> {
        Arc::clone(&self.local)
    }

    /// Returns the lookup service.
    pub fn lookup(&self) -> Arc<dyn OrderLookup> {
        self.lookup.clone()
    }

    /// Returns the ingestion pipeline.
    pub fn pipeline(&self) -> Arc<IngestionPipeline> {
        Arc::clone(&self.pipeline)
    }

    /// Returns the cache warmer.
    pub fn warmer(&self) -> Arc<CacheWarmer> {
        Arc::clone(&self.warmer)
    }
}

/// Infrastructure handles that outlive the module.
pub struct Infrastructure {
    pub database: Arc<DatabasePool>,
    pub distributed: Arc<dyn DistributedCache>,
}

/// Connects the record store and the distributed cache.
///
/// A record store connection failure is fatal. An unreachable distributed
/// cache is logged and the tier is disabled.
pub async fn connect_infrastructure(config: &AppConfig) -> OrdersResult<Infrastructure> {
    let database = create_pool(&config.database).await?;

    if config.database.run_migrations {
        database.run_migrations().await?;
    }

    let distributed: Arc<dyn DistributedCache> = if config.redis.enabled {
        match create_redis_pool(&config.redis).await {
            Ok(pool) => Arc::new(RedisCacheService::new(pool)),
            Err(e) => {
                warn!(
                    error = %e,
                    "Distributed cache unavailable; serving from local cache and record store"
                );
                Arc::new(RedisCacheService::disabled())
            }
        }
    } else {
        info!("Distributed cache disabled by configuration");
        Arc::new(RedisCacheService::disabled())
    };

    Ok(Infrastructure {
        database,
        distributed,
    })
}

/// Redis server the order feed reads from.
///
/// Falls back to `redis.url`, which stays in use for the feed even when the
/// distributed cache tier is disabled.
pub fn feed_url(config: &AppConfig) -> &str {
    if let Some(url) = config.feed.url.as_deref() {
        return url;
    }
    if !config.redis.enabled {
        warn!(
            url = %config.redis.url,
            "Distributed cache is disabled but the order feed still reads from redis.url"
        );
    }
    &config.redis.url
}

/// Builds the module from configuration and connected infrastructure.
pub fn build_module(config: &AppConfig, infrastructure: &Infrastructure) -> AppModule {
    let pool: Arc<dyn DatabasePoolInterface> = infrastructure.database.clone();
    let repository: Arc<dyn OrderRepository> = Arc::new(PostgresOrderRepository::new(pool));

    AppModule::assemble(
        repository,
        Arc::clone(&infrastructure.distributed),
        CachePolicy::from(&config.cache),
        config.feed.error_backoff(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use orders_core::Order;
    use orders_repository::ScannedOrder;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapRepository {
        rows: Mutex<HashMap<String, Order>>,
    }

    #[async_trait]
    impl OrderRepository for MapRepository {
        async fn find_by_uid(&self, order_uid: &str) -> OrdersResult<Option<Order>> {
            Ok(self.rows.lock().unwrap().get(order_uid).cloned())
        }

        async fn insert_if_absent(&self, order: &Order) -> OrdersResult<bool> {
            let mut rows = self.rows.lock().unwrap();
            if rows.contains_key(&order.order_uid) {
                return Ok(false);
            }
            rows.insert(order.order_uid.clone(), order.clone());
            Ok(true)
        }

        async fn find_recent(&self, limit: u32) -> OrdersResult<Vec<ScannedOrder>> {
            let rows = self.rows.lock().unwrap();
            let mut orders: Vec<Order> = rows.values().cloned().collect();
            orders.sort_by(|a, b| b.order_uid.cmp(&a.order_uid));
            Ok(orders.into_iter().take(limit as usize).map(Ok).collect())
        }
    }

    fn module() -> AppModule {
        AppModule::assemble(
            Arc::new(MapRepository::default()),
            Arc::new(RedisCacheService::disabled()),
            CachePolicy::default(),
            Duration::from_millis(10),
        )
    }

    #[test]
    fn test_feed_url_prefers_feed_section() {
        let mut config = AppConfig::default();
        config.redis.url = "redis://cache:6379".to_string();
        config.feed.url = Some("redis://stream:6379".to_string());
        assert_eq!(feed_url(&config), "redis://stream:6379");
    }

    #[test]
    fn test_feed_url_falls_back_to_redis_when_cache_disabled() {
        let mut config = AppConfig::default();
        config.redis.url = "redis://cache:6379".to_string();
        config.redis.enabled = false;
        assert_eq!(feed_url(&config), "redis://cache:6379");
    }

    #[tokio::test]
    async fn test_ingested_order_is_visible_to_lookup() {
        let module = module();
        let payload = Order::new("A2", "TRK2", "{}", "{}", "[]")
            .unwrap()
            .to_json()
            .unwrap();

        module.pipeline().handle(payload.as_bytes()).await;

        assert!(module.local_cache().contains("A2"));
        let found = module.lookup().find_order("A2").await.unwrap();
        assert_eq!(found.track_number, "TRK2");
    }

    #[tokio::test]
    async fn test_warmer_shares_local_cache() {
        let repository = Arc::new(MapRepository::default());
        repository
            .insert_if_absent(&Order::new("W1", "T", "{}", "{}", "[]").unwrap())
            .await
            .unwrap();
        let module = AppModule::assemble(
            repository,
            Arc::new(RedisCacheService::disabled()),
            CachePolicy::default(),
            Duration::from_millis(10),
        );

        let report = module.warmer().warm(10).await.unwrap();

        assert_eq!(report.loaded, 1);
        assert!(module.local_cache().contains("W1"));
    }
}
