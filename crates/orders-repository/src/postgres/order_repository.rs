//! PostgreSQL order repository implementation.

use crate::{traits::OrderRepository, DatabasePoolInterface, ScannedOrder};
use orders_core::{Order, OrdersError, OrdersResult};
use async_trait::async_trait;
use serde_json::value::RawValue;
use sqlx::types::Json;
use sqlx::FromRow;
use std::sync::Arc;
use tracing::debug;

/// PostgreSQL order repository implementation.
#[derive(Clone)]
pub struct PostgresOrderRepository {
    pool: Arc<dyn DatabasePoolInterface>,
}

impl PostgresOrderRepository {
    /// Creates a new PostgreSQL order repository.
    #[must_use]
    pub fn new(pool: Arc<dyn DatabasePoolInterface>) -> Self {
        Self { pool }
    }
}

/// Database row representation of an order.
///
/// The payload columns are nullable; SQL `NULL` reads back as JSON `null`.
#[derive(Debug, FromRow)]
struct OrderRow {
    order_uid: String,
    track_number: String,
    delivery: Option<Json<Box<RawValue>>>,
    payment: Option<Json<Box<RawValue>>>,
    items: Option<Json<Box<RawValue>>>,
}

fn payload(column: Option<Json<Box<RawValue>>>) -> Box<RawValue> {
    column.map_or_else(|| RawValue::NULL.to_owned(), |json| json.0)
}

impl TryFrom<OrderRow> for Order {
    type Error = OrdersError;

    fn try_from(row: OrderRow) -> OrdersResult<Self> {
        if row.order_uid.is_empty() {
            return Err(OrdersError::malformed("stored order has an empty order_uid"));
        }
        Ok(Order {
            order_uid: row.order_uid,
            track_number: row.track_number,
            delivery: payload(row.delivery),
            payment: payload(row.payment),
            items: payload(row.items),
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_by_uid(&self, order_uid: &str) -> OrdersResult<Option<Order>> {
        debug!("Finding order by uid: {}", order_uid);

        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT order_uid, track_number, delivery, payment, items
            FROM orders
            WHERE order_uid = $1
            "#,
        )
        .bind(order_uid)
        .fetch_optional(self.pool.inner())
        .await?;

        row.map(Order::try_from).transpose()
    }

    async fn insert_if_absent(&self, order: &Order) -> OrdersResult<bool> {
        debug!("Inserting order if absent: {}", order.order_uid);

        let result = sqlx::query(
            r#"
            INSERT INTO orders (order_uid, track_number, delivery, payment, items)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (order_uid) DO NOTHING
            "#,
        )
        .bind(&order.order_uid)
        .bind(&order.track_number)
        .bind(Json(order.delivery.as_ref()))
        .bind(Json(order.payment.as_ref()))
        .bind(Json(order.items.as_ref()))
        .execute(self.pool.inner())
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn find_recent(&self, limit: u32) -> OrdersResult<Vec<ScannedOrder>> {
        debug!("Scanning {} most recent orders", limit);

        let rows = sqlx::query(
            r#"
            SELECT order_uid, track_number, delivery, payment, items
            FROM orders
            ORDER BY order_uid DESC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(self.pool.inner())
        .await?;

        Ok(rows
            .iter()
            .map(|row| {
                OrderRow::from_row(row)
                    .map_err(|e| OrdersError::malformed(format!("Undecodable order row: {}", e)))
                    .and_then(Order::try_from)
            })
            .collect())
    }
}

impl std::fmt::Debug for PostgresOrderRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresOrderRepository").finish_non_exhaustive()
    }
}
