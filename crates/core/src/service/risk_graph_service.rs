use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::time::Instant;

use nexus_registry::{
    CanonicalRecord, Country, Identifier, ProviderRegistry, RegistryHealth, ResolutionError,
    TimeoutStage,
};

use super::service_model::{DatabaseStats, RateLimiterStats};
use super::service_traits::RiskGraphServiceTrait;
use crate::cache::{graph_key, CacheLayer, CacheStats, FastCache};
use crate::config::{EngineConfig, GraphSettings};
use crate::errors::Error;
use crate::graph::{EntitySource, GraphBuilder, ResultGraph, RiskScorer};
use crate::history::{MemorySearchHistory, NewSearch, SearchHistoryRepository, SearchRecord};
use crate::resolution::ResolutionPipeline;
use crate::store::RecordStore;

/// Resolves entities on behalf of one caller tier.
struct CallerSource<'a> {
    pipeline: &'a ResolutionPipeline,
    tier: &'a str,
}

#[async_trait]
impl<'a> EntitySource for CallerSource<'a> {
    async fn resolve(&self, identifier: &Identifier) -> Result<CanonicalRecord, ResolutionError> {
        self.pipeline.resolve(identifier, self.tier).await
    }
}

/// Service turning raw queries into scored risk graphs.
///
/// Searches are logged to an in-memory window unless a durable repository is
/// supplied with [`RiskGraphService::with_history`].
pub struct RiskGraphService {
    pipeline: ResolutionPipeline,
    cache: CacheLayer,
    store: Arc<dyn RecordStore>,
    history: Arc<dyn SearchHistoryRepository>,
    scorer: RiskScorer,
    graph_settings: GraphSettings,
    graph_ttl: Duration,
}

impl RiskGraphService {
    pub fn new(
        config: &EngineConfig,
        registry: Arc<ProviderRegistry>,
        cache: Arc<dyn FastCache>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        let cache = CacheLayer::new(cache, config.cache.operation_timeout());
        let pipeline = ResolutionPipeline::new(registry, cache.clone(), store.clone(), config);
        Self {
            pipeline,
            cache,
            store,
            history: Arc::new(MemorySearchHistory::new()),
            scorer: RiskScorer::new(config.detectors.clone()),
            graph_settings: config.graph.clone(),
            graph_ttl: config.cache.graph_ttl(),
        }
    }

    pub fn with_history(mut self, history: Arc<dyn SearchHistoryRepository>) -> Self {
        self.history = history;
        self
    }

    pub fn pipeline(&self) -> &ResolutionPipeline {
        &self.pipeline
    }

    fn identify(&self, raw_query: &str) -> Result<Identifier, ResolutionError> {
        let (_, identifier) = self.pipeline.registry().router().route(raw_query)?;
        Ok(identifier)
    }

    /// A failed history write never fails the search.
    async fn record_search(
        &self,
        raw_query: &str,
        identifier: Option<&Identifier>,
        tier: &str,
        outcome: &Result<ResultGraph, ResolutionError>,
    ) {
        let search = NewSearch::new(raw_query, identifier, tier, outcome);
        if let Err(e) = self.history.record(search).await {
            warn!("Could not record search '{}': {}", raw_query.trim(), e);
        }
    }

    async fn build_graph(
        &self,
        identifier: &Identifier,
        tier: &str,
    ) -> Result<ResultGraph, ResolutionError> {
        let key = graph_key(identifier);

        if let Some(graph) = self.cache.get_json::<ResultGraph>(&key).await {
            debug!("Graph cache hit for {}", key);
            return Ok(graph);
        }

        let deadline = Instant::now() + self.graph_settings.timeout();
        let root = tokio::time::timeout_at(deadline, self.pipeline.resolve(identifier, tier))
            .await
            .map_err(|_| ResolutionError::Timeout {
                stage: TimeoutStage::Graph,
            })??;

        let source = CallerSource {
            pipeline: &self.pipeline,
            tier,
        };
        let mut graph = GraphBuilder::new(&source, &self.graph_settings, deadline)
            .build(root)
            .await;
        self.scorer.score(&mut graph);

        info!(
            "Built graph for {}: {} nodes, {} edges, score {:.1}{}",
            identifier,
            graph.nodes.len(),
            graph.edges.len(),
            graph.headline_score,
            if graph.partial { " (partial)" } else { "" }
        );

        if graph.partial {
            debug!("Not caching partial graph for {}", identifier);
        } else {
            self.cache.put_json(&key, &graph, self.graph_ttl).await;
        }
        Ok(graph)
    }
}

#[async_trait]
impl RiskGraphServiceTrait for RiskGraphService {
    async fn resolve_entity(
        &self,
        raw_query: &str,
        tier: &str,
    ) -> Result<ResultGraph, ResolutionError> {
        let identifier = self.identify(raw_query);
        let outcome = match &identifier {
            Ok(identifier) => self.build_graph(identifier, tier).await,
            Err(e) => Err(e.clone()),
        };
        self.record_search(raw_query, identifier.as_ref().ok(), tier, &outcome)
            .await;
        outcome
    }

    fn get_provider_health(&self) -> RegistryHealth {
        self.pipeline.registry().health()
    }

    fn reset_provider(&self, provider_id: &str) -> bool {
        self.pipeline.registry().reset_provider(provider_id)
    }

    fn reset_all_providers(&self) {
        self.pipeline.registry().reset_all();
    }

    async fn invalidate_graph(&self, raw_query: &str) -> Result<(), ResolutionError> {
        let identifier = self.identify(raw_query)?;
        self.cache.delete(&graph_key(&identifier)).await;
        info!("Invalidated cached graph for {}", identifier);
        Ok(())
    }

    async fn get_search_history(
        &self,
        limit: usize,
        country: Option<Country>,
    ) -> Result<Vec<SearchRecord>, Error> {
        self.history.recent(limit, country).await
    }

    fn get_cache_stats(&self) -> Option<CacheStats> {
        self.cache.stats()
    }

    fn get_rate_limiter_stats(&self) -> RateLimiterStats {
        RateLimiterStats {
            tiers: self.pipeline.tier_buckets(),
            providers: self.pipeline.registry().outbound_buckets(),
        }
    }

    async fn get_database_stats(&self) -> Result<DatabaseStats, Error> {
        Ok(DatabaseStats {
            records: self.store.count().await?,
            searches: self.history.count().await?,
        })
    }
}
