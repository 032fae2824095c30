use serde::Serialize;

use nexus_registry::BucketStats;

/// Token buckets on both sides of the engine.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimiterStats {
    /// Inbound, one per configured caller tier
    pub tiers: Vec<BucketStats>,
    /// Outbound, one per provider
    pub providers: Vec<BucketStats>,
}

/// Row counts of the durable collaborators.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub records: u64,
    pub searches: u64,
}
