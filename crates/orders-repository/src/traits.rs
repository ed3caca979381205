//! Repository trait definitions.

use orders_core::{Interface, Order, OrdersResult};
use async_trait::async_trait;

/// One row of a bulk scan. Rows whose stored payload cannot be decoded come
/// back as `Err` without failing the whole scan.
pub type ScannedOrder = OrdersResult<Order>;

/// Order record store.
///
/// Rows are insert-once: nothing here updates or deletes an order.
#[async_trait]
pub trait OrderRepository: Interface + Send + Sync {
    /// Finds an order by its identifier.
    async fn find_by_uid(&self, order_uid: &str) -> OrdersResult<Option<Order>>;

    /// Inserts the order unless a row with the same identifier exists.
    ///
    /// Returns `true` when a new row was written, `false` when the call was
    /// a no-op against an existing row.
    async fn insert_if_absent(&self, order: &Order) -> OrdersResult<bool>;

    /// Returns up to `limit` orders, highest identifier first.
    async fn find_recent(&self, limit: u32) -> OrdersResult<Vec<ScannedOrder>>;
}
