//! Event-feed ingestion: decode, persist once, populate both cache tiers.

mod feed;
mod pipeline;
mod redis_feed;

pub use feed::{ChannelFeed, FeedMessage, OrderFeed};
pub use pipeline::{IngestOutcome, IngestionPipeline, IngestionStats};
pub use redis_feed::RedisStreamFeed;
