//! Redis stream order feed.

use super::{FeedMessage, OrderFeed};
use async_trait::async_trait;
use deadpool_redis::{Pool, PoolConfig, Runtime};
use orders_config::{FeedConfig, FeedStart};
use orders_core::{OrdersError, OrdersResult};
use redis::streams::{StreamRangeReply, StreamReadOptions, StreamReadReply};
use redis::AsyncCommands;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Reads serialized orders from a Redis stream with `XREAD BLOCK`.
///
/// Entries are consumed in stream order from a single reader position; there
/// is no consumer group and no acknowledgment.
pub struct RedisStreamFeed {
    pool: Arc<Pool>,
    stream_key: String,
    payload_field: String,
    start_from: FeedStart,
    batch_size: usize,
    block: Duration,
    last_id: Option<String>,
    buffer: VecDeque<FeedMessage>,
}

impl RedisStreamFeed {
    /// Creates a feed reading the configured stream.
    #[must_use]
    pub fn new(pool: Arc<Pool>, config: &FeedConfig) -> Self {
        Self {
            pool,
            stream_key: config.stream_key.clone(),
            payload_field: config.payload_field.clone(),
            start_from: config.start_from,
            batch_size: config.batch_size,
            block: config.block(),
            last_id: None,
            buffer: VecDeque::new(),
        }
    }

    /// Creates a feed with its own single-connection pool.
    ///
    /// The pool connects lazily, so an unreachable server surfaces as read
    /// errors rather than a startup failure.
    pub fn from_url(url: &str, config: &FeedConfig) -> OrdersResult<Self> {
        let mut redis_cfg = deadpool_redis::Config::from_url(url);
        redis_cfg.pool = Some(PoolConfig::new(1));
        let pool = redis_cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| OrdersError::Feed(format!("Failed to create feed pool: {}", e)))?;
        Ok(Self::new(Arc::new(pool), config))
    }

    async fn conn(&self) -> OrdersResult<deadpool_redis::Connection> {
        self.pool
            .get()
            .await
            .map_err(|e| OrdersError::Feed(format!("Failed to get Redis connection: {}", e)))
    }

    /// Pins `$` to a concrete id so entries added between reads are not skipped.
    async fn resolve_start(&self, conn: &mut deadpool_redis::Connection) -> OrdersResult<String> {
        match self.start_from {
            FeedStart::Earliest => Ok(self.start_from.initial_id().to_string()),
            FeedStart::Newest => {
                let reply: StreamRangeReply = conn
                    .xrevrange_count(&self.stream_key, "+", "-", 1)
                    .await
                    .map_err(|e| OrdersError::Feed(format!("Failed to read stream tail: {}", e)))?;
                Ok(reply
                    .ids
                    .into_iter()
                    .next()
                    .map_or_else(|| FeedStart::Earliest.initial_id().to_string(), |entry| entry.id))
            }
        }
    }

    /// Pins the read position if it is not pinned yet and returns it.
    ///
    /// Entries added after this returns are delivered by `recv`, including
    /// with a `newest` start.
    pub async fn ensure_positioned(&mut self) -> OrdersResult<&str> {
        let id = match self.last_id.take() {
            Some(id) => id,
            None => {
                let mut conn = self.conn().await?;
                let id = self.resolve_start(&mut conn).await?;
                info!(
                    stream = %self.stream_key,
                    start = %self.start_from,
                    position = %id,
                    "Order feed positioned"
                );
                id
            }
        };
        Ok(self.last_id.insert(id).as_str())
    }

    async fn fill(&mut self) -> OrdersResult<()> {
        let last_id = self.ensure_positioned().await?.to_string();
        let mut conn = self.conn().await?;

        let options = StreamReadOptions::default()
            .count(self.batch_size)
            .block(self.block.as_millis() as usize);

        let reply: Option<StreamReadReply> = conn
            .xread_options(&[&self.stream_key], &[&last_id], &options)
            .await
            .map_err(|e| {
                OrdersError::Feed(format!("XREAD on '{}' failed: {}", self.stream_key, e))
            })?;

        let Some(reply) = reply else {
            return Ok(());
        };

        for key in reply.keys {
            for entry in key.ids {
                match entry.get::<Vec<u8>>(&self.payload_field) {
                    Some(payload) => self.buffer.push_back(FeedMessage {
                        id: entry.id.clone(),
                        payload,
                    }),
                    None => warn!(
                        entry_id = %entry.id,
                        field = %self.payload_field,
                        "Skipping stream entry without payload field"
                    ),
                }
                self.last_id = Some(entry.id);
            }
        }

        debug!(buffered = self.buffer.len(), "Read order feed batch");
        Ok(())
    }
}

#[async_trait]
impl OrderFeed for RedisStreamFeed {
    async fn recv(&mut self) -> OrdersResult<Option<FeedMessage>> {
        loop {
            if let Some(message) = self.buffer.pop_front() {
                return Ok(Some(message));
            }
            self.fill().await?;
        }
    }
}

impl std::fmt::Debug for RedisStreamFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStreamFeed")
            .field("stream_key", &self.stream_key)
            .field("payload_field", &self.payload_field)
            .field("last_id", &self.last_id)
            .field("buffered", &self.buffer.len())
            .finish_non_exhaustive()
    }
}
