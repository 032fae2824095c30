use async_trait::async_trait;

use nexus_registry::{Country, RegistryHealth, ResolutionError};

use super::service_model::{DatabaseStats, RateLimiterStats};
use crate::cache::CacheStats;
use crate::errors::Error;
use crate::graph::ResultGraph;
use crate::history::SearchRecord;

/// Trait defining the contract for the risk graph service.
#[async_trait]
pub trait RiskGraphServiceTrait: Send + Sync {
    /// Route a raw query, resolve it and its related entities, and score the
    /// resulting graph. `tier` selects the caller's rate-limit bucket.
    ///
    /// Every call is written to the search history, whatever its outcome.
    async fn resolve_entity(
        &self,
        raw_query: &str,
        tier: &str,
    ) -> Result<ResultGraph, ResolutionError>;

    /// Circuit, bucket and egress state of every provider.
    fn get_provider_health(&self) -> RegistryHealth;

    /// Reset one provider's circuit and outbound bucket. `false` if unknown.
    fn reset_provider(&self, provider_id: &str) -> bool;

    fn reset_all_providers(&self);

    /// Drop the cached graph rooted at the entity `raw_query` names.
    async fn invalidate_graph(&self, raw_query: &str) -> Result<(), ResolutionError>;

    /// Up to `limit` past searches, newest first.
    async fn get_search_history(
        &self,
        limit: usize,
        country: Option<Country>,
    ) -> Result<Vec<SearchRecord>, Error>;

    /// `None` when the fast cache cannot report its size.
    fn get_cache_stats(&self) -> Option<CacheStats>;

    fn get_rate_limiter_stats(&self) -> RateLimiterStats;

    async fn get_database_stats(&self) -> Result<DatabaseStats, Error>;
}
