//! # Orders Service
//!
//! The tiered caching core of the order lookup service.
//!
//! ```text
//!            LocalCache  (in-process, no expiry)
//!                ↓ miss
//!        DistributedCache (Redis, per-key TTL)
//!                ↓ miss
//!         OrderRepository (PostgreSQL, source of truth)
//! ```
//!
//! Three writers share the two cache tiers: the [`CacheWarmer`] seeds them
//! once at startup, the [`IngestionPipeline`] refreshes them for every
//! consumed order event, and the [`OrderLookupService`] backfills them on
//! read-through. They communicate only through those shared components.

pub mod cache;
pub mod ingestion;
pub mod lookup_service;
pub mod metrics;
pub mod policy;
pub mod warmer;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::*;
pub use ingestion::*;
pub use lookup_service::*;
pub use policy::*;
pub use warmer::*;
