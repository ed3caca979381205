//! Cache tiers.
//!
//! [`LocalCache`] is the process-local tier. [`DistributedCache`] abstracts
//! the shared network tier, with [`RedisCacheService`] as its implementation.

mod cache_interface;
mod local_cache;
mod redis_cache;

pub use cache_interface::{populate_best_effort, DistributedCache, DistributedCacheExt, NO_EXPIRY};
pub use local_cache::LocalCache;
pub use redis_cache::{create_redis_pool, RedisCacheService};
