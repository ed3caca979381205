//! Prometheus metrics for lookup, ingestion and warming.

use ::metrics::{counter, describe_counter};

/// Metric names for the order service.
pub mod names {
    /// Lookups, labelled by the tier that answered.
    pub const LOOKUP_TOTAL: &str = "orders_lookup_total";
    /// Feed messages handled, labelled by outcome.
    pub const INGEST_TOTAL: &str = "orders_ingest_total";
    /// Records handled by the startup warmer, labelled by outcome.
    pub const WARM_TOTAL: &str = "orders_warm_total";
}

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(
        names::LOOKUP_TOTAL,
        "Total number of order lookups by answering tier"
    );
    describe_counter!(
        names::INGEST_TOTAL,
        "Total number of feed messages by ingestion outcome"
    );
    describe_counter!(
        names::WARM_TOTAL,
        "Total number of records handled by the cache warmer"
    );
}

/// Tier that answered a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupTier {
    /// Process-local cache.
    Local,
    /// Shared distributed cache.
    Distributed,
    /// Record store.
    Store,
    /// No tier had the record.
    Miss,
}

impl LookupTier {
    /// Label value for this tier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Distributed => "distributed",
            Self::Store => "store",
            Self::Miss => "miss",
        }
    }
}

/// Record a lookup answered by `tier`.
pub fn record_lookup(tier: LookupTier) {
    counter!(names::LOOKUP_TOTAL, "tier" => tier.as_str()).increment(1);
}

/// Record one ingested message.
pub fn record_ingest(outcome: &'static str) {
    counter!(names::INGEST_TOTAL, "outcome" => outcome).increment(1);
}

/// Record one warmed or skipped record.
pub fn record_warm(outcome: &'static str) {
    counter!(names::WARM_TOTAL, "outcome" => outcome).increment(1);
}
