//! Process-local order cache.

use orders_core::Order;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Process-local map from order identifier to order record.
///
/// Readers share the lock and writers hold it exclusively. Records are
/// stored behind an `Arc` and replaced whole, so a reader sees either the
/// previous record or the new one, never a mix. Entries never expire and are
/// never evicted.
#[derive(Debug, Default)]
pub struct LocalCache {
    entries: RwLock<HashMap<String, Arc<Order>>>,
}

impl LocalCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached record, if any. A miss is a normal outcome.
    #[must_use]
    pub fn get(&self, order_uid: &str) -> Option<Arc<Order>> {
        self.entries.read().get(order_uid).cloned()
    }

    /// Stores the record under its own identifier, replacing any previous entry.
    pub fn set(&self, order: Arc<Order>) {
        self.entries.write().insert(order.order_uid.clone(), order);
    }

    /// Stores the record only if its identifier is absent and returns the
    /// resident entry.
    pub fn get_or_insert(&self, order: Arc<Order>) -> Arc<Order> {
        let mut entries = self.entries.write();
        Arc::clone(entries.entry(order.order_uid.clone()).or_insert(order))
    }

    /// Returns true if an entry exists for the identifier.
    #[must_use]
    pub fn contains(&self, order_uid: &str) -> bool {
        self.entries.read().contains_key(order_uid)
    }

    /// Returns the number of cached records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
