use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::watch;

use nexus_registry::{
    BucketStats, CanonicalRecord, Identifier, ProviderRegistry, RateLimiter, ResolutionError,
    TimeoutStage,
};

use crate::cache::{record_key, CacheLayer, CachedLookup};
use crate::config::{EngineConfig, DEFAULT_TIER};
use crate::store::RecordStore;

type Outcome = Result<CanonicalRecord, ResolutionError>;

/// Receives the outcome of one in-flight acquisition; `None` until it settles.
type InFlight = watch::Receiver<Option<Outcome>>;

/// The resolution pipeline.
///
/// Cheap to clone; clones share the cache, store, tier buckets and the
/// in-flight table.
#[derive(Clone)]
pub struct ResolutionPipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    registry: Arc<ProviderRegistry>,
    cache: CacheLayer,
    store: Arc<dyn RecordStore>,
    tiers: RateLimiter,
    known_tiers: HashSet<String>,
    in_flight: Mutex<HashMap<String, InFlight>>,
    positive_ttl: Duration,
    negative_ttl: Duration,
    resolve_timeout: Duration,
}

impl ResolutionPipeline {
    pub fn new(
        registry: Arc<ProviderRegistry>,
        cache: CacheLayer,
        store: Arc<dyn RecordStore>,
        config: &EngineConfig,
    ) -> Self {
        let tiers = RateLimiter::with_default(config.default_tier_limits());
        tiers.configure(DEFAULT_TIER, config.default_tier_limits());
        for (tier, limits) in &config.tiers {
            tiers.configure(tier, limits.clone());
        }

        Self {
            inner: Arc::new(PipelineInner {
                registry,
                cache,
                store,
                tiers,
                known_tiers: config.tiers.keys().cloned().collect(),
                in_flight: Mutex::new(HashMap::new()),
                positive_ttl: config.cache.positive_ttl(),
                negative_ttl: config.cache.negative_ttl(),
                resolve_timeout: config.pipeline.resolve_timeout(),
            }),
        }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.inner.registry
    }

    /// Resolve one identifier on behalf of a caller tier.
    ///
    /// Bounded by the pipeline timeout, including time spent waiting on a
    /// duplicate acquisition. Giving up here never cancels that acquisition.
    pub async fn resolve(&self, identifier: &Identifier, tier: &str) -> Outcome {
        let inner = Arc::clone(&self.inner);
        let lookup = inner.resolve(identifier.clone(), tier.to_string());
        match tokio::time::timeout(self.inner.resolve_timeout, lookup).await {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(
                    "Resolution of {} exceeded {:?}",
                    identifier, self.inner.resolve_timeout
                );
                Err(ResolutionError::Timeout {
                    stage: TimeoutStage::Resolve,
                })
            }
        }
    }

    /// Drop the cached record (or negative entry) for `identifier`.
    pub async fn invalidate(&self, identifier: &Identifier) {
        self.inner.cache.delete(&record_key(identifier)).await;
    }

    /// Caller tier buckets. Unconfigured tiers draw from the `free` entry.
    pub fn tier_buckets(&self) -> Vec<BucketStats> {
        self.inner.tiers.stats()
    }

    /// Number of live acquisitions currently shared through the in-flight table.
    pub fn in_flight(&self) -> usize {
        self.inner.lock_in_flight().len()
    }
}

impl PipelineInner {
    async fn resolve(self: Arc<Self>, identifier: Identifier, tier: String) -> Outcome {
        let key = record_key(&identifier);

        if let Some(cached) = self.cache.get_json::<CachedLookup>(&key).await {
            debug!("Cache hit for {}", key);
            return cached_outcome(cached, &identifier);
        }

        match self.store.get(&identifier).await {
            Ok(Some(record)) => {
                debug!("Store hit for {}, promoting to cache", key);
                let entry = CachedLookup::Found {
                    record: Box::new(record.clone()),
                };
                self.cache.put_json(&key, &entry, self.positive_ttl).await;
                return Ok(record);
            }
            Ok(None) => {}
            Err(e) => warn!("Store read for {} failed, treating as miss: {}", key, e),
        }

        let mut outcome = self.join_or_start(identifier, &tier)?;
        let settled = match outcome.wait_for(Option::is_some).await {
            Ok(value) => (*value).clone(),
            Err(_) => None,
        };
        settled.unwrap_or_else(|| {
            Err(ResolutionError::Unavailable {
                provider: "pipeline".to_string(),
                message: "acquisition ended without an outcome".to_string(),
            })
        })
    }

    /// Subscribe to the in-flight acquisition for `identifier`, starting it if
    /// there is none. The owner runs on its own task so abandoned callers do
    /// not cancel it.
    ///
    /// Only a caller that starts an acquisition spends a token from its tier,
    /// and a rejection is returned to that caller alone.
    fn join_or_start(
        self: &Arc<Self>,
        identifier: Identifier,
        tier: &str,
    ) -> Result<InFlight, ResolutionError> {
        let key = identifier.key();
        let (sender, receiver) = {
            let mut in_flight = self.lock_in_flight();
            if let Some(existing) = in_flight.get(&key) {
                debug!("Joining in-flight acquisition of {}", key);
                return Ok(existing.clone());
            }
            self.take_tier_token(&identifier, tier)?;
            let (sender, receiver) = watch::channel(None);
            in_flight.insert(key.clone(), receiver.clone());
            (sender, receiver)
        };

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let outcome = inner.acquire(&identifier).await;
            inner.lock_in_flight().remove(&key);
            sender.send_replace(Some(outcome));
        });

        Ok(receiver)
    }

    /// Bucket a caller tier draws from. Tiers without configured limits share
    /// the default tier's bucket.
    fn bucket_for<'a>(&self, tier: &'a str) -> &'a str {
        if self.known_tiers.contains(tier) {
            tier
        } else {
            DEFAULT_TIER
        }
    }

    fn take_tier_token(&self, identifier: &Identifier, tier: &str) -> Result<(), ResolutionError> {
        let bucket = self.bucket_for(tier);
        self.tiers.try_acquire(bucket).map_err(|limited| {
            debug!("Tier '{}' exhausted, rejecting {}", bucket, identifier);
            ResolutionError::RateLimited {
                scope: format!("tier:{}", bucket),
                retry_after: limited.retry_after,
            }
        })
    }

    /// Live acquisition, run by the owner of the in-flight entry.
    async fn acquire(&self, identifier: &Identifier) -> Outcome {
        let key = record_key(identifier);

        // a previous owner may have settled between the caller's miss and now
        if let Some(cached) = self.cache.get_json::<CachedLookup>(&key).await {
            debug!("Cache filled while {} was queued, skipping live call", key);
            return cached_outcome(cached, identifier);
        }

        let outcome = self.registry.acquire(identifier).await;
        match &outcome {
            Ok(record) => {
                if let Err(e) = self.store.put(identifier, record).await {
                    warn!("Store write for {} failed: {}", key, e);
                }
                let entry = CachedLookup::Found {
                    record: Box::new(record.clone()),
                };
                self.cache.put_json(&key, &entry, self.positive_ttl).await;
                info!("Resolved {} via {}", identifier, record.source_provider);
            }
            Err(ResolutionError::NotFound { .. }) => {
                self.cache
                    .put_json(&key, &CachedLookup::NotFound, self.negative_ttl)
                    .await;
                debug!("{} confirmed absent, cached negative entry", identifier);
            }
            Err(e) => debug!("Acquisition of {} failed: {}", identifier, e),
        }
        outcome
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<String, InFlight>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| {
            warn!("In-flight table lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

fn cached_outcome(cached: CachedLookup, identifier: &Identifier) -> Outcome {
    match cached {
        CachedLookup::Found { record } => Ok(*record),
        CachedLookup::NotFound => Err(ResolutionError::NotFound {
            identifier: identifier.key(),
        }),
    }
}
