//! Tests for RiskGraphService.
//!
//! # Contract Points
//!
//! 1. Complete graphs are cached per root; partial graphs are not
//! 2. Unrecognized queries fail before any I/O
//! 3. Root failures are returned as errors, associate failures as omissions
//! 4. Administration delegates to the provider registry
//! 5. Every search is recorded, including failures; a broken history never
//!    fails a search
//! 6. Statistics report the cache, both sides of rate limiting, and row counts

#[cfg(test)]
mod tests {
    use crate::cache::{graph_key, FastCache, MemoryCache};
    use crate::config::EngineConfig;
    use crate::errors::{self, DatabaseError};
    use crate::history::{NewSearch, SearchHistoryRepository, SearchRecord, OUTCOME_OK};
    use crate::service::{RiskGraphService, RiskGraphServiceTrait};
    use crate::store::MemoryRecordStore;
    use async_trait::async_trait;
    use chrono::Utc;
    use nexus_registry::provider::DEFAULT_MAX_RESPONSE_BYTES;
    use nexus_registry::{
        Associate, AssociateRole, CanonicalRecord, CircuitBreaker, CircuitState, Country,
        EgressPool, EntityStatus, Identifier, IdentifierKind, Party, ProviderCapabilities,
        ProviderError, ProviderRegistry, RawPayload, RawRecord, RegistryProvider,
        ResolutionError, Route, TaxFlags, UnavailableCause,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    // =========================================================================
    // Table-driven provider
    // =========================================================================

    /// Answers from a table keyed by IČO; unknown numbers are NotFound, the
    /// ones in `broken` are Unavailable.
    struct TableProvider {
        records: HashMap<String, CanonicalRecord>,
        broken: Vec<String>,
        calls: AtomicUsize,
    }

    impl TableProvider {
        fn new(records: Vec<CanonicalRecord>) -> Self {
            Self {
                records: records
                    .into_iter()
                    .map(|r| (r.identifier.value.clone(), r))
                    .collect(),
                broken: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RegistryProvider for TableProvider {
        fn id(&self) -> &'static str {
            "SK_RPO"
        }

        fn country(&self) -> Country {
            Country::Sk
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities {
                identifier_kinds: &[IdentifierKind::RegistrationNumber],
                supports_associates: true,
                supports_debts: false,
            }
        }

        fn max_response_bytes(&self) -> usize {
            DEFAULT_MAX_RESPONSE_BYTES
        }

        fn classify(&self, raw: &str) -> Option<Identifier> {
            (raw.len() == 8 && raw.chars().all(|c| c.is_ascii_digit()))
                .then(|| Identifier::registration(Country::Sk, raw))
        }

        async fn fetch(
            &self,
            identifier: &Identifier,
            _route: &Route,
        ) -> Result<RawRecord, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.broken.contains(&identifier.value) {
                return Err(ProviderError::Unavailable {
                    provider: "SK_RPO".to_string(),
                    cause: UnavailableCause::Upstream,
                    message: "503".to_string(),
                });
            }
            let record = self
                .records
                .get(&identifier.value)
                .cloned()
                .ok_or_else(|| ProviderError::NotFound {
                    provider: "SK_RPO".to_string(),
                    identifier: identifier.key(),
                })?;
            Ok(RawRecord {
                identifier: identifier.clone(),
                provider: "SK_RPO",
                fetched_at: Utc::now(),
                payload: RawPayload::Canonical(Box::new(record)),
                debts: None,
            })
        }
    }

    fn company(value: &str, owners: &[&str]) -> CanonicalRecord {
        CanonicalRecord {
            identifier: Identifier::registration(Country::Sk, value),
            legal_name: format!("Firma {} s.r.o.", value),
            country: Country::Sk,
            status: EntityStatus::Active,
            registered_address: None,
            associates: owners
                .iter()
                .map(|owner| Associate {
                    name: format!("Firma {} s.r.o.", owner),
                    role: AssociateRole::Owner,
                    share_pct: None,
                    party: Party::Company {
                        identifier: Identifier::registration(Country::Sk, *owner),
                    },
                })
                .collect(),
            tax_flags: TaxFlags::default(),
            legal_form: None,
            founded_on: None,
            terminated_on: None,
            source_provider: String::new(),
            fetched_at: Utc::now(),
        }
    }

    fn service(
        provider: TableProvider,
    ) -> (RiskGraphService, Arc<TableProvider>, Arc<MemoryCache>) {
        let config = EngineConfig::default();
        let provider = Arc::new(provider);
        let registry = ProviderRegistry::new(
            vec![provider.clone() as Arc<dyn RegistryProvider>],
            CircuitBreaker::with_config(config.breaker.to_config()),
            Arc::new(EgressPool::direct().unwrap()),
        );
        let cache = Arc::new(MemoryCache::new());
        let service = RiskGraphService::new(
            &config,
            Arc::new(registry),
            cache.clone(),
            Arc::new(MemoryRecordStore::new()),
        );
        (service, provider, cache)
    }

    fn root_key() -> String {
        graph_key(&Identifier::registration(Country::Sk, "88888888"))
    }

    // =========================================================================
    // Graph caching
    // =========================================================================

    #[tokio::test]
    async fn test_complete_graph_is_cached() {
        let (service, provider, cache) = service(TableProvider::new(vec![
            company("88888888", &["77777777"]),
            company("77777777", &[]),
        ]));

        let first = service.resolve_entity("SK:88888888", "free").await.unwrap();
        assert!(!first.partial);
        assert_eq!(provider.call_count(), 2);
        assert!(cache.get(&root_key()).await.unwrap().is_some());

        let second = service.resolve_entity("88888888", "free").await.unwrap();
        assert_eq!(second.generated_at, first.generated_at);
        assert_eq!(second.nodes.len(), first.nodes.len());
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_partial_graph_is_not_cached() {
        let mut provider = TableProvider::new(vec![company("88888888", &["77777777"])]);
        provider.broken.push("77777777".to_string());
        let (service, provider, cache) = service(provider);

        let graph = service.resolve_entity("88888888", "free").await.unwrap();
        assert!(graph.partial);
        assert_eq!(graph.omitted.len(), 1);
        assert!(cache.get(&root_key()).await.unwrap().is_none());

        // the root comes from the record cache, the broken associate is retried
        service.resolve_entity("88888888", "free").await.unwrap();
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_invalidate_graph_drops_cached_graph() {
        let (service, _provider, cache) =
            service(TableProvider::new(vec![company("88888888", &[])]));

        service.resolve_entity("88888888", "free").await.unwrap();
        assert!(cache.get(&root_key()).await.unwrap().is_some());

        service.invalidate_graph("SK:88888888").await.unwrap();
        assert!(cache.get(&root_key()).await.unwrap().is_none());
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[tokio::test]
    async fn test_unrecognized_query_does_no_io() {
        let (service, provider, _cache) = service(TableProvider::new(vec![]));

        let result = service.resolve_entity("hello?", "free").await;
        assert!(matches!(
            result,
            Err(ResolutionError::UnrecognizedIdentifier(_))
        ));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_root_is_not_found() {
        let (service, _provider, _cache) = service(TableProvider::new(vec![]));

        let result = service.resolve_entity("12345678", "free").await;
        assert!(matches!(result, Err(ResolutionError::NotFound { .. })));
    }

    // =========================================================================
    // Administration
    // =========================================================================

    #[tokio::test]
    async fn test_health_and_reset_delegate_to_registry() {
        let mut provider = TableProvider::new(vec![]);
        provider.broken.push("88888888".to_string());
        let (service, _provider, _cache) = service(provider);

        for _ in 0..5 {
            let _ = service.resolve_entity("88888888", "free").await;
        }
        let health = service.get_provider_health();
        assert_eq!(health.providers[0].state, CircuitState::Open);

        assert!(!service.reset_provider("PL_KRS"));
        assert!(service.reset_provider("sk_rpo"));
        assert_eq!(
            service.get_provider_health().providers[0].state,
            CircuitState::Closed
        );

        service.reset_all_providers();
        assert_eq!(service.get_provider_health().routes.len(), 1);
    }

    // =========================================================================
    // Search history
    // =========================================================================

    struct BrokenHistory;

    #[async_trait]
    impl SearchHistoryRepository for BrokenHistory {
        async fn record(&self, _search: NewSearch) -> errors::Result<()> {
            Err(DatabaseError::QueryFailed("read-only".to_string()).into())
        }

        async fn recent(
            &self,
            _limit: usize,
            _country: Option<Country>,
        ) -> errors::Result<Vec<SearchRecord>> {
            Err(DatabaseError::QueryFailed("read-only".to_string()).into())
        }

        async fn count(&self) -> errors::Result<u64> {
            Err(DatabaseError::QueryFailed("read-only".to_string()).into())
        }
    }

    #[tokio::test]
    async fn test_every_search_is_recorded() {
        let (service, _provider, _cache) = service(TableProvider::new(vec![
            company("88888888", &["77777777"]),
            company("77777777", &[]),
        ]));

        service.resolve_entity(" SK:88888888 ", "pro").await.unwrap();
        let _ = service.resolve_entity("12345678", "free").await;
        let _ = service.resolve_entity("hello?", "free").await;

        let history = service.get_search_history(10, None).await.unwrap();
        assert_eq!(history.len(), 3);

        let unrecognized = &history[0].search;
        assert_eq!(unrecognized.outcome, "unrecognized_identifier");
        assert_eq!(unrecognized.country, None);
        assert_eq!(unrecognized.identifier, None);

        let missing = &history[1].search;
        assert_eq!(missing.outcome, "not_found");
        assert_eq!(missing.result_count, 0);
        assert_eq!(missing.risk_score, None);

        let found = &history[2].search;
        assert_eq!(found.query, "SK:88888888");
        assert_eq!(found.outcome, OUTCOME_OK);
        assert_eq!(found.tier, "pro");
        assert_eq!(found.country, Some(Country::Sk));
        assert_eq!(
            found.identifier,
            Some(Identifier::registration(Country::Sk, "88888888").key())
        );
        assert!(found.result_count >= 2);
        assert!(found.risk_score.is_some());

        let slovak = service
            .get_search_history(10, Some(Country::Sk))
            .await
            .unwrap();
        assert_eq!(slovak.len(), 2);
        assert!(service
            .get_search_history(10, Some(Country::Hu))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_broken_history_does_not_fail_search() {
        let (service, _provider, _cache) =
            service(TableProvider::new(vec![company("88888888", &[])]));
        let service = service.with_history(Arc::new(BrokenHistory));

        let graph = service.resolve_entity("88888888", "free").await.unwrap();
        assert_eq!(graph.root, Identifier::registration(Country::Sk, "88888888"));
        assert!(service.get_search_history(10, None).await.is_err());
        assert!(service.get_database_stats().await.is_err());
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    #[tokio::test]
    async fn test_stats_cover_cache_buckets_and_rows() {
        let (service, _provider, _cache) =
            service(TableProvider::new(vec![company("88888888", &[])]));

        service.resolve_entity("88888888", "pro").await.unwrap();

        // the record entry and the graph entry
        let cache = service.get_cache_stats().unwrap();
        assert_eq!(cache.live, 2);
        assert!(cache.bytes > 0);

        let buckets = service.get_rate_limiter_stats();
        let tiers: Vec<_> = buckets.tiers.iter().map(|b| b.key.as_str()).collect();
        assert_eq!(tiers, vec!["enterprise", "free", "pro"]);
        let pro = &buckets.tiers[2];
        assert!(pro.tokens < f64::from(pro.burst_capacity));
        assert_eq!(buckets.providers.len(), 1);
        assert_eq!(buckets.providers[0].key, "SK_RPO");

        let rows = service.get_database_stats().await.unwrap();
        assert_eq!(rows.records, 1);
        assert_eq!(rows.searches, 1);
    }
}
