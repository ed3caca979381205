//! Read-through order lookup across the three tiers.

use crate::cache::{populate_best_effort, DistributedCache, DistributedCacheExt, LocalCache};
use crate::metrics::{record_lookup, LookupTier};
use crate::policy::{within, CachePolicy};
use async_trait::async_trait;
use orders_core::{Interface, Order};
use orders_repository::OrderRepository;
use std::sync::Arc;
use tracing::{debug, warn};

/// Single-item order lookup.
#[async_trait]
pub trait OrderLookup: Interface + Send + Sync {
    /// Finds an order by identifier.
    ///
    /// Tier failures are absorbed; `None` means no tier could produce the
    /// record.
    async fn find_order(&self, order_uid: &str) -> Option<Arc<Order>>;
}

/// Lookup service falling through local cache, distributed cache and record
/// store, backfilling the faster tiers on the way out.
pub struct OrderLookupService {
    local: Arc<LocalCache>,
    distributed: Arc<dyn DistributedCache>,
    repository: Arc<dyn OrderRepository>,
    policy: CachePolicy,
}

impl OrderLookupService {
    /// Creates a new lookup service over the shared tiers.
    pub fn new(
        local: Arc<LocalCache>,
        distributed: Arc<dyn DistributedCache>,
        repository: Arc<dyn OrderRepository>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            local,
            distributed,
            repository,
            policy,
        }
    }

    async fn from_distributed(&self, order_uid: &str) -> Option<Order> {
        if !self.distributed.is_enabled() {
            return None;
        }

        match within(
            self.policy.cache_timeout,
            "distributed cache get",
            self.distributed.get_order(order_uid),
        )
        .await
        {
            Ok(found) => found,
            Err(e) => {
                warn!(order_uid, error = %e, "Distributed cache get failed; falling through");
                None
            }
        }
    }
}

#[async_trait]
impl OrderLookup for OrderLookupService {
    async fn find_order(&self, order_uid: &str) -> Option<Arc<Order>> {
        if order_uid.is_empty() {
            return None;
        }

        if let Some(order) = self.local.get(order_uid) {
            debug!(order_uid, tier = "local", "Lookup hit");
            record_lookup(LookupTier::Local);
            return Some(order);
        }

        if let Some(order) = self.from_distributed(order_uid).await {
            debug!(order_uid, tier = "distributed", "Lookup hit");
            record_lookup(LookupTier::Distributed);
            return Some(self.local.get_or_insert(Arc::new(order)));
        }

        match within(
            self.policy.store_timeout,
            "record store lookup",
            self.repository.find_by_uid(order_uid),
        )
        .await
        {
            Ok(Some(order)) => {
                debug!(order_uid, tier = "store", "Lookup hit");
                record_lookup(LookupTier::Store);
                let order = Arc::new(order);
                let resident = self.local.get_or_insert(Arc::clone(&order));
                populate_best_effort(
                    self.distributed.as_ref(),
                    &order,
                    self.policy.entry_ttl,
                    self.policy.cache_timeout,
                )
                .await;
                Some(resident)
            }
            Ok(None) => {
                debug!(order_uid, "Lookup miss on every tier");
                record_lookup(LookupTier::Miss);
                None
            }
            Err(e) => {
                warn!(order_uid, error = %e, "Record store lookup failed; reporting not found");
                record_lookup(LookupTier::Miss);
                None
            }
        }
    }
}

impl std::fmt::Debug for OrderLookupService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderLookupService")
            .field("local_entries", &self.local.len())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
