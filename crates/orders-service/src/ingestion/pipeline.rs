//! Ingestion pipeline.

use super::OrderFeed;
use crate::cache::{populate_best_effort, DistributedCache, LocalCache};
use crate::metrics::record_ingest;
use crate::policy::{within, CachePolicy};
use orders_core::Order;
use orders_repository::OrderRepository;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Default pause after a failed feed read.
pub const DEFAULT_ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// What happened to one feed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// New row stored; caches populated.
    Inserted,
    /// Row already present; caches refreshed.
    Duplicate,
    /// Payload did not decode; message discarded.
    Malformed,
    /// Store write failed; message discarded.
    StoreFailed,
}

impl IngestOutcome {
    /// Label value for this outcome.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inserted => "inserted",
            Self::Duplicate => "duplicate",
            Self::Malformed => "malformed",
            Self::StoreFailed => "store_failed",
        }
    }
}

/// Counters for one pipeline run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestionStats {
    pub inserted: u64,
    pub duplicates: u64,
    pub malformed: u64,
    pub store_failed: u64,
    pub feed_errors: u64,
}

impl IngestionStats {
    fn record(&mut self, outcome: IngestOutcome) {
        match outcome {
            IngestOutcome::Inserted => self.inserted += 1,
            IngestOutcome::Duplicate => self.duplicates += 1,
            IngestOutcome::Malformed => self.malformed += 1,
            IngestOutcome::StoreFailed => self.store_failed += 1,
        }
    }

    /// Total messages taken off the feed.
    #[must_use]
    pub const fn handled(&self) -> u64 {
        self.inserted + self.duplicates + self.malformed + self.store_failed
    }
}

/// Consumes order events and writes them through to the store and caches.
///
/// Each message gets one attempt: decode, insert-if-absent, then populate
/// both caches whether or not the insert created a row.
pub struct IngestionPipeline {
    local: Arc<LocalCache>,
    distributed: Arc<dyn DistributedCache>,
    repository: Arc<dyn OrderRepository>,
    policy: CachePolicy,
    error_backoff: Duration,
}

impl IngestionPipeline {
    /// Creates a new pipeline over the shared tiers.
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
            error_backoff: DEFAULT_ERROR_BACKOFF,
        }
    }

    /// Sets the pause applied after a failed feed read.
    #[must_use]
    pub fn with_error_backoff(mut self, error_backoff: Duration) -> Self {
        self.error_backoff = error_backoff;
        self
    }

    /// Handles one serialized order.
    pub async fn handle(&self, payload: &[u8]) -> IngestOutcome {
        let outcome = self.process(payload).await;
        record_ingest(outcome.as_str());
        outcome
    }

    async fn process(&self, payload: &[u8]) -> IngestOutcome {
        let order = match Order::from_json(payload) {
            Ok(order) => order,
            Err(e) => {
                warn!(error = %e, bytes = payload.len(), "Discarding undecodable order event");
                return IngestOutcome::Malformed;
            }
        };

        let inserted = match within(
            self.policy.store_timeout,
            "record store insert",
            self.repository.insert_if_absent(&order),
        )
        .await
        {
            Ok(inserted) => inserted,
            Err(e) => {
                warn!(
                    order_uid = %order.order_uid,
                    error = %e,
                    "Store write failed; dropping order event"
                );
                return IngestOutcome::StoreFailed;
            }
        };

        let order = Arc::new(order);
        self.local.set(Arc::clone(&order));
        populate_best_effort(
            self.distributed.as_ref(),
            &order,
            self.policy.entry_ttl,
            self.policy.cache_timeout,
        )
        .await;

        if inserted {
            debug!(order_uid = %order.order_uid, "Ingested new order");
            IngestOutcome::Inserted
        } else {
            debug!(order_uid = %order.order_uid, "Order already stored; caches refreshed");
            IngestOutcome::Duplicate
        }
    }

    /// Consumes `feed` until it closes or `shutdown` fires.
    pub async fn run<F: OrderFeed>(
        &self,
        mut feed: F,
        mut shutdown: broadcast::Receiver<()>,
    ) -> IngestionStats {
        info!("Ingestion pipeline started");
        let mut stats = IngestionStats::default();

        loop {
            let next = tokio::select! {
                biased;

                _ = shutdown.recv() => {
                    info!("Ingestion pipeline received shutdown signal");
                    break;
                }

                next = feed.recv() => next,
            };

            match next {
                Ok(Some(message)) => {
                    let outcome = self.handle(&message.payload).await;
                    debug!(
                        message_id = %message.id,
                        outcome = outcome.as_str(),
                        "Handled feed message"
                    );
                    stats.record(outcome);
                }
                Ok(None) => {
                    info!("Order feed closed");
                    break;
                }
                Err(e) => {
                    stats.feed_errors += 1;
                    error!(
                        error = %e,
                        backoff_ms = self.error_backoff.as_millis() as u64,
                        "Order feed read failed"
                    );
                    tokio::select! {
                        biased;

                        _ = shutdown.recv() => {
                            info!("Ingestion pipeline received shutdown signal");
                            break;
                        }

                        () = tokio::time::sleep(self.error_backoff) => {}
                    }
                }
            }
        }

        info!(
            inserted = stats.inserted,
            duplicates = stats.duplicates,
            malformed = stats.malformed,
            store_failed = stats.store_failed,
            feed_errors = stats.feed_errors,
            "Ingestion pipeline stopped"
        );
        stats
    }
}

impl std::fmt::Debug for IngestionPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionPipeline")
            .field("policy", &self.policy)
            .field("error_backoff", &self.error_backoff)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{DistributedCacheExt, NO_EXPIRY};
    use crate::ingestion::{ChannelFeed, FeedMessage};
    use crate::lookup_service::{OrderLookup, OrderLookupService};
    use crate::test_support::{
        sample_order, sample_payload, InMemoryDistributedCache, InMemoryRepository,
    };
    use async_trait::async_trait;
    use orders_core::{OrdersError, OrdersResult};
    use std::collections::VecDeque;

    struct Fixture {
        local: Arc<LocalCache>,
        distributed: Arc<InMemoryDistributedCache>,
        repository: Arc<InMemoryRepository>,
        pipeline: IngestionPipeline,
    }

    fn fixture() -> Fixture {
        let local = Arc::new(LocalCache::new());
        let distributed = Arc::new(InMemoryDistributedCache::new());
        let repository = Arc::new(InMemoryRepository::new());
        let pipeline = IngestionPipeline::new(
            Arc::clone(&local),
            distributed.clone(),
            repository.clone(),
            CachePolicy::default(),
        );
        Fixture {
            local,
            distributed,
            repository,
            pipeline,
        }
    }

    #[tokio::test]
    async fn test_new_order_is_stored_and_cached() {
        let f = fixture();

        let outcome = f.pipeline.handle(&sample_payload("A2", "TRK2")).await;
        assert_eq!(outcome, IngestOutcome::Inserted);
        assert_eq!(f.repository.row_count(), 1);
        assert!(f.local.contains("A2"));
        assert_eq!(f.distributed.expires("A2"), Some(true));
    }

    #[tokio::test]
    async fn test_redelivery_keeps_one_row_and_serves_from_local() {
        let f = fixture();
        let payload = sample_payload("A2", "TRK2");

        assert_eq!(f.pipeline.handle(&payload).await, IngestOutcome::Inserted);
        assert_eq!(f.pipeline.handle(&payload).await, IngestOutcome::Duplicate);
        assert_eq!(f.repository.row_count(), 1);
        assert_eq!(f.repository.insert_calls(), 2);

        let lookup = OrderLookupService::new(
            Arc::clone(&f.local),
            f.distributed.clone(),
            f.repository.clone(),
            CachePolicy::default(),
        );
        let found = lookup.find_order("A2").await.unwrap();
        assert_eq!(found.track_number, "TRK2");
        assert_eq!(f.repository.find_calls(), 0);
    }

    #[tokio::test]
    async fn test_duplicate_refreshes_caches_without_touching_store_row() {
        let f = fixture();
        f.pipeline.handle(&sample_payload("A3", "ORIGINAL")).await;

        let outcome = f.pipeline.handle(&sample_payload("A3", "REPLAYED")).await;
        assert_eq!(outcome, IngestOutcome::Duplicate);
        assert_eq!(f.repository.stored("A3").unwrap().track_number, "ORIGINAL");
        assert_eq!(f.local.get("A3").unwrap().track_number, "REPLAYED");
    }

    #[tokio::test]
    async fn test_malformed_payload_is_discarded() {
        let f = fixture();

        let payloads: [&[u8]; 3] = [
            b"not json",
            br#"{"order_uid":"X"}"#,
            br#"{"order_uid":"","track_number":"T","delivery":{},"payment":{},"items":[]}"#,
        ];
        for payload in payloads {
            assert_eq!(f.pipeline.handle(payload).await, IngestOutcome::Malformed);
        }
        assert_eq!(f.repository.insert_calls(), 0);
        assert!(f.local.is_empty());
        assert_eq!(f.distributed.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_drops_event_and_leaves_caches_alone() {
        let f = fixture();
        f.repository.set_failing(true);

        let outcome = f.pipeline.handle(&sample_payload("A4", "TRK4")).await;
        assert_eq!(outcome, IngestOutcome::StoreFailed);
        assert_eq!(f.repository.insert_calls(), 1);
        assert!(!f.local.contains("A4"));
        assert_eq!(f.distributed.set_calls(), 0);
    }

    #[tokio::test]
    async fn test_distributed_failure_does_not_fail_ingestion() {
        let f = fixture();
        f.distributed.set_failing(true);

        let outcome = f.pipeline.handle(&sample_payload("A5", "TRK5")).await;
        assert_eq!(outcome, IngestOutcome::Inserted);
        assert!(f.local.contains("A5"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ingested_entries_expire_but_warm_entries_do_not() {
        let f = fixture();
        f.pipeline.handle(&sample_payload("ING", "T1")).await;
        f.distributed
            .set_order(&sample_order("WARM", "T2"), NO_EXPIRY)
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(61)).await;

        assert!(f.distributed.get_order("ING").await.unwrap().is_none());
        assert!(f.distributed.get_order("WARM").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_run_consumes_until_feed_closes() {
        let f = fixture();
        let (tx, feed) = ChannelFeed::channel(8);
        tx.send(sample_payload("R1", "T")).await.unwrap();
        tx.send(sample_payload("R1", "T")).await.unwrap();
        tx.send(b"garbage".to_vec()).await.unwrap();
        tx.send(sample_payload("R2", "T")).await.unwrap();
        drop(tx);

        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let stats = f.pipeline.run(feed, shutdown_rx).await;

        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.duplicates, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.handled(), 4);
        assert_eq!(f.repository.row_count(), 2);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let f = fixture();
        let (_tx, feed) = ChannelFeed::channel(1);
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        shutdown_tx.send(()).unwrap();

        let stats = f.pipeline.run(feed, shutdown_rx).await;
        assert_eq!(stats, IngestionStats::default());
    }

    /// Feed that fails each read listed in `script` before yielding messages.
    struct ScriptedFeed {
        script: VecDeque<OrdersResult<Option<FeedMessage>>>,
    }

    #[async_trait]
    impl OrderFeed for ScriptedFeed {
        async fn recv(&mut self) -> OrdersResult<Option<FeedMessage>> {
            self.script.pop_front().unwrap_or(Ok(None))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_backs_off_after_feed_error() {
        let f = fixture();
        let pipeline = f.pipeline.with_error_backoff(Duration::from_millis(250));
        let feed = ScriptedFeed {
            script: VecDeque::from([
                Err(OrdersError::Feed("connection reset".to_string())),
                Ok(Some(FeedMessage {
                    id: "1-0".to_string(),
                    payload: sample_payload("B1", "T"),
                })),
            ]),
        };
        let (_shutdown_tx, shutdown_rx) = broadcast::channel(1);

        let started = tokio::time::Instant::now();
        let stats = pipeline.run(feed, shutdown_rx).await;

        assert!(started.elapsed() >= Duration::from_millis(250));
        assert_eq!(stats.feed_errors, 1);
        assert_eq!(stats.inserted, 1);
        assert!(f.local.contains("B1"));
    }
}
