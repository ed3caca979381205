//! Distributed cache interface.

use crate::policy::within;
use async_trait::async_trait;
use orders_core::{Interface, Order, OrdersError, OrdersResult};
use std::time::Duration;
use tracing::{debug, warn};

/// TTL value meaning "never expires".
pub const NO_EXPIRY: Duration = Duration::ZERO;

/// Shared, network-accessible key-value cache with per-key TTL.
///
/// The distributed tier is an optimization only. Callers treat a failed
/// `get_raw` as a miss and ignore a failed `set_raw`.
#[async_trait]
pub trait DistributedCache: Interface + Send + Sync {
    /// Get a raw serialized value.
    ///
    /// Returns `None` if the key doesn't exist or has expired.
    async fn get_raw(&self, key: &str) -> OrdersResult<Option<String>>;

    /// Set a raw serialized value. A `ttl` of [`NO_EXPIRY`] stores the value
    /// without expiry.
    async fn set_raw(&self, key: &str, value: &str, ttl: Duration) -> OrdersResult<()>;

    /// Check if the tier is enabled.
    fn is_enabled(&self) -> bool;
}

/// Order-typed access on top of [`DistributedCache`].
#[async_trait]
pub trait DistributedCacheExt: DistributedCache {
    /// Get the cached order for an identifier.
    ///
    /// A value that does not decode, or that decodes to a different
    /// identifier, is reported as [`OrdersError::MalformedPayload`].
    async fn get_order(&self, order_uid: &str) -> OrdersResult<Option<Order>> {
        match self.get_raw(order_uid).await? {
            Some(raw) => {
                let order = Order::from_json(raw.as_bytes())?;
                if order.order_uid != order_uid {
                    return Err(OrdersError::malformed(format!(
                        "cached value for '{}' holds order '{}'",
                        order_uid, order.order_uid
                    )));
                }
                Ok(Some(order))
            }
            None => Ok(None),
        }
    }

    /// Cache the order, as a complete unit, under its identifier.
    async fn set_order(&self, order: &Order, ttl: Duration) -> OrdersResult<()> {
        let json = order.to_json()?;
        self.set_raw(&order.order_uid, &json, ttl).await
    }
}

// Blanket implementation for all DistributedCache implementations
impl<T: DistributedCache + ?Sized> DistributedCacheExt for T {}

/// Caches the order in the distributed tier, ignoring any failure.
pub async fn populate_best_effort(
    cache: &dyn DistributedCache,
    order: &Order,
    ttl: Duration,
    budget: Duration,
) {
    if !cache.is_enabled() {
        return;
    }

    match within(budget, "distributed cache set", cache.set_order(order, ttl)).await {
        Ok(()) => debug!(
            order_uid = %order.order_uid,
            ttl_secs = ttl.as_secs(),
            "Populated distributed cache"
        ),
        Err(e) => warn!(
            order_uid = %order.order_uid,
            error = %e,
            "Distributed cache set failed; ignoring"
        ),
    }
}
