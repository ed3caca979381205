//! The order record entity.

use crate::{OrdersError, OrdersResult};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

/// An order record.
///
/// `delivery`, `payment` and `items` are opaque JSON payloads. They are kept
/// as [`RawValue`] so their bytes pass through every tier unchanged; nothing
/// in the service parses them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique, immutable order identifier. Cache key and primary key.
    pub order_uid: String,
    /// Carrier tracking number.
    pub track_number: String,
    /// Delivery payload.
    pub delivery: Box<RawValue>,
    /// Payment payload.
    pub payment: Box<RawValue>,
    /// Line-item payload.
    pub items: Box<RawValue>,
}

impl Order {
    /// Builds an order from its identifier, tracking number and raw JSON
    /// payloads. Each payload must be valid JSON.
    pub fn new(
        order_uid: impl Into<String>,
        track_number: impl Into<String>,
        delivery: impl Into<String>,
        payment: impl Into<String>,
        items: impl Into<String>,
    ) -> OrdersResult<Self> {
        let order = Self {
            order_uid: order_uid.into(),
            track_number: track_number.into(),
            delivery: RawValue::from_string(delivery.into())?,
            payment: RawValue::from_string(payment.into())?,
            items: RawValue::from_string(items.into())?,
        };
        order.validate()?;
        Ok(order)
    }

    /// Decodes an order from a serialized payload (event feed message or
    /// distributed cache value).
    pub fn from_json(bytes: &[u8]) -> OrdersResult<Self> {
        let order: Self = serde_json::from_slice(bytes)?;
        order.validate()?;
        Ok(order)
    }

    /// Serializes the order as a complete unit.
    pub fn to_json(&self) -> OrdersResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    fn validate(&self) -> OrdersResult<()> {
        if self.order_uid.is_empty() {
            return Err(OrdersError::malformed("order_uid must not be empty"));
        }
        Ok(())
    }
}

impl PartialEq for Order {
    fn eq(&self, other: &Self) -> bool {
        self.order_uid == other.order_uid
            && self.track_number == other.track_number
            && self.delivery.get() == other.delivery.get()
            && self.payment.get() == other.payment.get()
            && self.items.get() == other.items.get()
    }
}

impl Eq for Order {}
