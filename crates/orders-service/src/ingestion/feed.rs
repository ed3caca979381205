//! Order feed abstraction.

use async_trait::async_trait;
use orders_core::OrdersResult;
use tokio::sync::mpsc;

/// One message taken from the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedMessage {
    /// Feed-assigned message identifier, for logging.
    pub id: String,
    /// Serialized order payload.
    pub payload: Vec<u8>,
}

/// Ordered, at-least-once source of serialized orders.
///
/// `recv` must be safe to drop mid-await; the pipeline races it against
/// shutdown.
#[async_trait]
pub trait OrderFeed: Send {
    /// Waits for the next message.
    ///
    /// Returns `Ok(None)` once the feed is closed for good. An `Err` is a
    /// read failure; the caller may call `recv` again.
    async fn recv(&mut self) -> OrdersResult<Option<FeedMessage>>;
}

/// Feed backed by an in-process channel.
#[derive(Debug)]
pub struct ChannelFeed {
    rx: mpsc::Receiver<Vec<u8>>,
    next_id: u64,
}

impl ChannelFeed {
    /// Wraps an existing receiver.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<Vec<u8>>) -> Self {
        Self { rx, next_id: 0 }
    }

    /// Creates a bounded channel and the feed reading from it.
    #[must_use]
    pub fn channel(capacity: usize) -> (mpsc::Sender<Vec<u8>>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl OrderFeed for ChannelFeed {
    async fn recv(&mut self) -> OrdersResult<Option<FeedMessage>> {
        Ok(self.rx.recv().await.map(|payload| {
            self.next_id += 1;
            FeedMessage {
                id: format!("channel-{}", self.next_id),
                payload,
            }
        }))
    }
}
