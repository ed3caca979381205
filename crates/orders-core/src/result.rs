//! Result type aliases for the order service.

use crate::OrdersError;

/// A specialized `Result` type for order operations.
pub type OrdersResult<T> = Result<T, OrdersError>;
