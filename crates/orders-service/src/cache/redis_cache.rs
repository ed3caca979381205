//! Redis-based distributed cache implementation.

use super::DistributedCache;
use deadpool_redis::{redis::AsyncCommands, Pool, PoolConfig, Runtime};
use orders_config::RedisConfig;
use orders_core::{OrdersError, OrdersResult};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Redis-based distributed cache service.
pub struct RedisCacheService {
    /// Redis connection pool. `None` when the tier is disabled.
    pool: Option<Arc<Pool>>,
}

impl RedisCacheService {
    /// Create a new Redis cache service.
    #[must_use]
    pub fn new(pool: Arc<Pool>) -> Self {
        Self { pool: Some(pool) }
    }

    /// Create a no-op cache service (for when Redis is disabled).
    #[must_use]
    pub fn disabled() -> Self {
        Self { pool: None }
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> OrdersResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => pool.get().await.map_err(|e| {
                OrdersError::Cache(format!("Failed to get Redis connection: {}", e))
            }),
            None => Err(OrdersError::Cache("Cache is disabled".to_string())),
        }
    }
}

#[async_trait]
impl DistributedCache for RedisCacheService {
    fn is_enabled(&self) -> bool {
        self.pool.is_some()
    }

    async fn get_raw(&self, key: &str) -> OrdersResult<Option<String>> {
        if !self.is_enabled() {
            return Ok(None);
        }

        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await.map_err(|e| {
            OrdersError::Cache(format!("Failed to get key '{}': {}", key, e))
        })?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> OrdersResult<()> {
        if !self.is_enabled() {
            return Ok(());
        }

        let mut conn = self.get_conn().await?;

        if ttl.is_zero() {
            conn.set::<_, _, ()>(key, value).await.map_err(|e| {
                OrdersError::Cache(format!("Failed to set key '{}': {}", key, e))
            })?;
            debug!("Cached key '{}' without expiry", key);
        } else {
            // Redis expiry is whole seconds, minimum 1.
            let ttl_secs = ttl.as_secs().max(1);
            conn.set_ex::<_, _, ()>(key, value, ttl_secs).await.map_err(|e| {
                OrdersError::Cache(format!("Failed to set key '{}': {}", key, e))
            })?;
            debug!("Cached key '{}' with TTL {}s", key, ttl_secs);
        }

        Ok(())
    }
}

impl std::fmt::Debug for RedisCacheService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCacheService")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Creates the shared Redis pool and verifies the server answers a PING.
pub async fn create_redis_pool(config: &RedisConfig) -> OrdersResult<Arc<Pool>> {
    info!("Connecting to Redis distributed cache...");

    let mut redis_cfg = deadpool_redis::Config::from_url(&config.url);
    redis_cfg.pool = Some(PoolConfig::new(config.pool_size));
    let pool = redis_cfg
        .create_pool(Some(Runtime::Tokio1))
        .map_err(|e| OrdersError::Cache(format!("Failed to create Redis pool: {}", e)))?;

    let mut conn = pool
        .get()
        .await
        .map_err(|e| OrdersError::Cache(format!("Failed to get Redis connection: {}", e)))?;
    let _: String = deadpool_redis::redis::cmd("PING")
        .query_async(&mut conn)
        .await
        .map_err(|e| OrdersError::Cache(format!("Redis PING failed: {}", e)))?;

    info!("Redis connection pool established");
    Ok(Arc::new(pool))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_cache() {
        let cache = RedisCacheService::disabled();
        assert!(!cache.is_enabled());
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache = RedisCacheService::disabled();
        cache.set_raw("A1", "{}", Duration::from_secs(60)).await.unwrap();
        assert!(cache.get_raw("A1").await.unwrap().is_none());
    }
}
