//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use nexus_core::cache::MemoryCache;
use nexus_core::store::MemoryRecordStore;
use nexus_core::{EngineConfig, RiskGraphService};
use nexus_registry::{
    Address, Associate, AssociateRole, CanonicalRecord, CircuitBreaker, Country, EgressPool,
    EntityStatus, Identifier, IdentifierKind, Party, ProviderCapabilities, ProviderError,
    ProviderRegistry, RateLimit, RawPayload, RawRecord, RegistryProvider, Route, TaxFlags,
    UnavailableCause,
};

/// Stands in for a national adapter: answers from a table, counts calls.
pub struct StubProvider {
    id: &'static str,
    country: Country,
    records: Mutex<HashMap<String, CanonicalRecord>>,
    failing: Mutex<bool>,
    delay: Duration,
    timeout: Duration,
    calls: AtomicUsize,
}

impl StubProvider {
    /// SK: 8-digit registration numbers.
    pub fn slovak() -> Self {
        Self::new("SK_RPO", Country::Sk)
    }

    /// HU: 11-digit tax numbers.
    pub fn hungarian() -> Self {
        Self::new("HU_NAV", Country::Hu)
    }

    fn new(id: &'static str, country: Country) -> Self {
        Self {
            id,
            country,
            records: Mutex::new(HashMap::new()),
            failing: Mutex::new(false),
            delay: Duration::ZERO,
            timeout: Duration::from_secs(10),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_record(self, record: CanonicalRecord) -> Self {
        self.records
            .lock()
            .unwrap()
            .insert(record.identifier.value.clone(), record);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Adapter-level deadline the registry enforces.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Every fetch answers `Unavailable` while set.
    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RegistryProvider for StubProvider {
    fn id(&self) -> &'static str {
        self.id
    }

    fn country(&self) -> Country {
        self.country
    }

    fn capabilities(&self) -> ProviderCapabilities {
        let identifier_kinds: &'static [IdentifierKind] = match self.country {
            Country::Hu => &[IdentifierKind::TaxNumber],
            _ => &[IdentifierKind::RegistrationNumber],
        };
        ProviderCapabilities {
            identifier_kinds,
            supports_associates: true,
            supports_debts: true,
        }
    }

    fn rate_limit(&self) -> RateLimit {
        RateLimit {
            requests_per_minute: 600,
            burst: 100,
        }
    }

    fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, raw: &str) -> Option<Identifier> {
        let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
        if digits.len() != raw.trim().len() {
            return None;
        }
        match (self.country, digits.len()) {
            (Country::Hu, 11) => Some(Identifier::new(
                Country::Hu,
                IdentifierKind::TaxNumber,
                digits,
            )),
            (Country::Sk, 8) => Some(Identifier::registration(Country::Sk, digits)),
            _ => None,
        }
    }

    async fn fetch(
        &self,
        identifier: &Identifier,
        _route: &Route,
    ) -> Result<RawRecord, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if *self.failing.lock().unwrap() {
            return Err(ProviderError::Unavailable {
                provider: self.id.to_string(),
                cause: UnavailableCause::Upstream,
                message: "HTTP 503".to_string(),
            });
        }
        let record = self
            .records
            .lock()
            .unwrap()
            .get(&identifier.value)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                provider: self.id.to_string(),
                identifier: identifier.key(),
            })?;
        Ok(RawRecord {
            identifier: identifier.clone(),
            provider: self.id,
            fetched_at: Utc::now(),
            payload: RawPayload::Canonical(Box::new(record)),
            debts: None,
        })
    }
}

/// Service over the given stubs with in-memory cache and store.
pub fn engine(providers: &[Arc<StubProvider>], config: &EngineConfig) -> RiskGraphService {
    let registry = ProviderRegistry::new(
        providers
            .iter()
            .map(|p| p.clone() as Arc<dyn RegistryProvider>)
            .collect(),
        CircuitBreaker::with_config(config.breaker.to_config()),
        Arc::new(EgressPool::direct().unwrap()),
    );
    RiskGraphService::new(
        config,
        Arc::new(registry),
        Arc::new(MemoryCache::new()),
        Arc::new(MemoryRecordStore::new()),
    )
}

pub fn sk(value: &str) -> Identifier {
    Identifier::registration(Country::Sk, value)
}

pub fn company(identifier: Identifier, status: EntityStatus) -> CanonicalRecord {
    CanonicalRecord {
        legal_name: format!("Spoločnosť {} s.r.o.", identifier.value),
        country: identifier.country,
        identifier,
        status,
        registered_address: None,
        associates: Vec::new(),
        tax_flags: TaxFlags::default(),
        legal_form: Some("Spoločnosť s ručením obmedzeným".to_string()),
        founded_on: None,
        terminated_on: None,
        source_provider: String::new(),
        fetched_at: Utc::now(),
    }
}

pub fn seated_at(mut record: CanonicalRecord, text: &str) -> CanonicalRecord {
    record.registered_address = Some(Address {
        text: text.to_string(),
        postal_code: None,
        city: None,
        country: record.country,
    });
    record
}

pub fn owned_by(mut record: CanonicalRecord, owner: &Identifier) -> CanonicalRecord {
    record.associates.push(Associate {
        name: format!("Spoločnosť {} s.r.o.", owner.value),
        role: AssociateRole::Owner,
        share_pct: None,
        party: Party::Company {
            identifier: owner.clone(),
        },
    });
    record
}
