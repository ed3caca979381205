//! Common test infrastructure for Redis integration tests.

use deadpool_redis::Pool;
use orders_config::RedisConfig;
use orders_service::create_redis_pool;
use std::sync::Arc;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::Redis;

/// Test Redis container wrapper.
pub struct TestRedis {
    _container: ContainerAsync<Redis>,
    url: String,
}

impl TestRedis {
    /// Starts a fresh Redis container.
    pub async fn new() -> Self {
        let container = Redis::default()
            .start()
            .await
            .expect("Failed to start Redis container");

        let port = container
            .get_host_port_ipv4(6379)
            .await
            .expect("Failed to get Redis port");

        Self {
            _container: container,
            url: format!("redis://127.0.0.1:{}", port),
        }
    }

    /// Returns the server URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Creates a pool against the container.
    pub async fn pool(&self) -> Arc<Pool> {
        let config = RedisConfig {
            url: self.url.clone(),
            pool_size: 2,
            enabled: true,
        };
        create_redis_pool(&config)
            .await
            .expect("Failed to connect to Redis")
    }
}
