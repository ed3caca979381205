//! TTL and call-budget policy shared by the lookup, ingestion and warming paths.

use orders_config::CacheConfig;
use orders_core::{OrdersError, OrdersResult};
use std::future::Future;
use std::time::Duration;

/// Cache tier policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Distributed TTL for ingested and lookup-resolved entries.
    pub entry_ttl: Duration,
    /// Distributed TTL for warmer-seeded entries. Zero means no expiry.
    pub warm_ttl: Duration,
    /// Budget for one record store call.
    pub store_timeout: Duration,
    /// Budget for one distributed cache call.
    pub cache_timeout: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::from(&CacheConfig::default())
    }
}

impl From<&CacheConfig> for CachePolicy {
    fn from(config: &CacheConfig) -> Self {
        Self {
            entry_ttl: config.entry_ttl(),
            warm_ttl: config.warm_ttl(),
            store_timeout: config.store_timeout(),
            cache_timeout: config.cache_timeout(),
        }
    }
}

/// Runs `call` within `budget`. An elapsed budget is reported as
/// [`OrdersError::Timeout`] and handled like any other failure of that call.
pub async fn within<T, F>(budget: Duration, operation: &'static str, call: F) -> OrdersResult<T>
where
    F: Future<Output = OrdersResult<T>>,
{
    match tokio::time::timeout(budget, call).await {
        Ok(result) => result,
        Err(_) => Err(OrdersError::Timeout(format!(
            "{} exceeded {}ms",
            operation,
            budget.as_millis()
        ))),
    }
}
