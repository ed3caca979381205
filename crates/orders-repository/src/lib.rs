//! # Orders Repository
//!
//! Record store access for order records.
//!
//! ```text
//! Lookup / Ingestion / Warmer
//!   ↓  Arc<dyn OrderRepository>   (store interface)
//! PostgresOrderRepository         (SQLx)
//!   ↓  Arc<dyn DatabasePoolInterface>
//! PostgreSQL `orders` table
//! ```
//!
//! The store issues three query shapes: point lookup by `order_uid`,
//! insert-if-absent of a full row, and a bulk "most recent N by identifier"
//! scan used for cache warming.

pub mod pool;
pub mod postgres;
pub mod traits;

pub use pool::*;
pub use postgres::*;
pub use traits::*;
