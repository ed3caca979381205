//! Startup cache warming.

use crate::cache::{populate_best_effort, DistributedCache, LocalCache};
use crate::metrics::record_warm;
use crate::policy::{within, CachePolicy};
use orders_core::OrdersResult;
use orders_repository::OrderRepository;
use std::sync::Arc;
use tracing::{info, warn};

/// Result of one warming pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WarmReport {
    /// Records placed into both caches.
    pub loaded: usize,
    /// Rows skipped because they could not be decoded.
    pub skipped: usize,
}

/// Seeds both cache tiers from the most recent records in the store.
pub struct CacheWarmer {
    local: Arc<LocalCache>,
    distributed: Arc<dyn DistributedCache>,
    repository: Arc<dyn OrderRepository>,
    policy: CachePolicy,
}

impl CacheWarmer {
    /// Creates a new warmer over the shared tiers.
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

    /// Loads up to `count` records, highest identifier first, into both
    /// caches. Existing local entries are overwritten.
    ///
    /// Undecodable rows are skipped. A failed scan aborts the pass and is
    /// returned to the caller.
    pub async fn warm(&self, count: u32) -> OrdersResult<WarmReport> {
        info!(count, "Warming caches from record store");

        let rows = within(
            self.policy.store_timeout,
            "record store scan",
            self.repository.find_recent(count),
        )
        .await?;

        let mut report = WarmReport::default();
        for row in rows {
            match row {
                Ok(order) => {
                    let order = Arc::new(order);
                    self.local.set(Arc::clone(&order));
                    populate_best_effort(
                        self.distributed.as_ref(),
                        &order,
                        self.policy.warm_ttl,
                        self.policy.cache_timeout,
                    )
                    .await;
                    record_warm("loaded");
                    report.loaded += 1;
                }
                Err(e) => {
                    warn!(error = %e, "Skipping undecodable row while warming");
                    record_warm("skipped");
                    report.skipped += 1;
                }
            }
        }

        info!(loaded = report.loaded, skipped = report.skipped, "Cache warming finished");
        Ok(report)
    }
}

impl std::fmt::Debug for CacheWarmer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheWarmer")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
