//! Engine configuration.
//!
//! Every section carries `#[serde(default)]`, so a JSON file only needs the
//! values it overrides:
//!
//! ```json
//! {
//!   "cache": { "negative_ttl_secs": 600 },
//!   "detectors": { "virtual_seat_threshold": 10 },
//!   "tiers": { "pro": { "requests_per_minute": 240, "burst_capacity": 60 } }
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use nexus_registry::{CircuitBreakerConfig, RateLimitConfig};

use crate::errors::{Error, Result};

/// Tier used when the caller did not say.
pub const DEFAULT_TIER: &str = "free";

/// Longest accepted cache lifetime (one year).
pub const MAX_TTL_SECS: u64 = 365 * 24 * 60 * 60;

/// Longest accepted timeout (one hour).
pub const MAX_TIMEOUT_MS: u64 = 60 * 60 * 1000;

/// Fast-cache lifetimes and the per-operation budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub positive_ttl_secs: u64,
    /// TTL for confirmed `NotFound` answers; must be shorter than the positive TTL.
    pub negative_ttl_secs: u64,
    pub graph_ttl_secs: u64,
    /// A cache call slower than this counts as unavailable.
    pub operation_timeout_ms: u64,
    /// How often the in-process cache drops expired entries.
    pub purge_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            positive_ttl_secs: 24 * 60 * 60,
            negative_ttl_secs: 60 * 60,
            graph_ttl_secs: 24 * 60 * 60,
            operation_timeout_ms: 250,
            purge_interval_secs: 5 * 60,
        }
    }
}

impl CacheSettings {
    pub fn positive_ttl(&self) -> Duration {
        Duration::from_secs(self.positive_ttl_secs.min(MAX_TTL_SECS))
    }

    pub fn negative_ttl(&self) -> Duration {
        Duration::from_secs(self.negative_ttl_secs.min(MAX_TTL_SECS))
    }

    pub fn graph_ttl(&self) -> Duration {
        Duration::from_secs(self.graph_ttl_secs.min(MAX_TTL_SECS))
    }

    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs.clamp(1, MAX_TTL_SECS))
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms.min(MAX_TIMEOUT_MS))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Whole single-entity resolution, including waiting on a duplicate.
    pub resolve_timeout_ms: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            resolve_timeout_ms: 20_000,
        }
    }
}

impl PipelineSettings {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_millis(self.resolve_timeout_ms.min(MAX_TIMEOUT_MS))
    }
}

/// Bounds on graph traversal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// How many company hops to resolve from the root. Zero resolves only the root.
    pub max_depth: usize,
    pub node_budget: usize,
    pub timeout_ms: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            max_depth: 2,
            node_budget: 60,
            timeout_ms: 45_000,
        }
    }
}

impl GraphSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.min(MAX_TIMEOUT_MS))
    }
}

/// Detector thresholds and weights.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    /// Company scores are clamped to `0..=max_score`.
    pub max_score: f64,
    pub debt_weight: f64,
    pub liquidation_weight: f64,
    /// Added to companies directly linked to one in liquidation or dissolved.
    pub related_liquidation_weight: f64,
    /// Companies at one address above which it is a virtual seat.
    pub virtual_seat_threshold: usize,
    /// Per company at the address.
    pub virtual_seat_weight: f64,
    pub virtual_seat_max: f64,
    /// Companies per person above which the person is overloaded.
    pub associate_overload_threshold: usize,
    /// Per company the person is attached to.
    pub associate_overload_weight: f64,
    pub associate_overload_max: f64,
    pub cross_border_weight: f64,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            max_score: 10.0,
            debt_weight: 7.0,
            liquidation_weight: 4.0,
            related_liquidation_weight: 3.5,
            virtual_seat_threshold: 5,
            virtual_seat_weight: 0.5,
            virtual_seat_max: 4.0,
            associate_overload_threshold: 5,
            associate_overload_weight: 0.5,
            associate_overload_max: 4.0,
            cross_border_weight: 2.0,
        }
    }
}

/// Circuit breaker settings, applied to every provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerSettings {
    pub failure_threshold: u32,
    pub failure_window_secs: u64,
    pub cooldown_secs: u64,
    pub backoff_multiplier: f64,
    pub max_cooldown_secs: u64,
    pub probe_timeout_secs: u64,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            failure_window_secs: 60,
            cooldown_secs: 60,
            backoff_multiplier: 2.0,
            max_cooldown_secs: 600,
            probe_timeout_secs: 30,
        }
    }
}

impl BreakerSettings {
    pub fn to_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            failure_window: Duration::from_secs(self.failure_window_secs),
            cooldown: Duration::from_secs(self.cooldown_secs),
            backoff_multiplier: self.backoff_multiplier,
            max_cooldown: Duration::from_secs(self.max_cooldown_secs),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
        }
    }
}

/// Outbound routes for live acquisition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EgressSettings {
    /// Proxy URLs. Empty means a single direct route.
    pub proxies: Vec<String>,
    pub failure_threshold: u32,
    pub probe_interval_secs: u64,
    pub probe_url: String,
}

impl Default for EgressSettings {
    fn default() -> Self {
        Self {
            proxies: Vec::new(),
            failure_threshold: 3,
            probe_interval_secs: 60,
            probe_url: "https://www.gstatic.com/generate_204".to_string(),
        }
    }
}

/// Per-provider overrides, keyed by provider id (`SK_RPO`, `SK_DEBTS`, ...).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub enabled: bool,
    pub base_url: Option<String>,
    /// Bearer token for registries that require one (`PL_CEIDG`).
    pub api_token: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            api_token: None,
        }
    }
}

/// Complete engine configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub cache: CacheSettings,
    pub pipeline: PipelineSettings,
    pub graph: GraphSettings,
    pub detectors: DetectorSettings,
    pub breaker: BreakerSettings,
    /// Caller tier buckets. Unknown tiers draw from the `free` bucket.
    pub tiers: HashMap<String, RateLimitConfig>,
    pub egress: EgressSettings,
    pub providers: HashMap<String, ProviderSettings>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let tiers = [
            (DEFAULT_TIER, RateLimitConfig::new(30, 30)),
            ("pro", RateLimitConfig::new(120, 120)),
            ("enterprise", RateLimitConfig::new(600, 600)),
        ]
        .into_iter()
        .map(|(tier, limits)| (tier.to_string(), limits))
        .collect();

        Self {
            cache: CacheSettings::default(),
            pipeline: PipelineSettings::default(),
            graph: GraphSettings::default(),
            detectors: DetectorSettings::default(),
            breaker: BreakerSettings::default(),
            tiers,
            egress: EgressSettings::default(),
            providers: HashMap::new(),
        }
    }
}

impl EngineConfig {
    /// Read a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigIO(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::ConfigIO(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Limits for the fallback tier.
    pub fn default_tier_limits(&self) -> RateLimitConfig {
        self.tiers.get(DEFAULT_TIER).cloned().unwrap_or_default()
    }

    /// Settings for one provider (enabled, no override, when not configured).
    pub fn provider(&self, id: &str) -> ProviderSettings {
        self.providers.get(id).cloned().unwrap_or_default()
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| Err(Error::InvalidConfigValue(message.to_string()));

        if self.cache.positive_ttl_secs == 0 {
            return invalid("cache.positive_ttl_secs must be positive");
        }
        if self.cache.negative_ttl_secs >= self.cache.positive_ttl_secs {
            return invalid("cache.negative_ttl_secs must be shorter than cache.positive_ttl_secs");
        }
        if self.cache.positive_ttl_secs > MAX_TTL_SECS || self.cache.graph_ttl_secs > MAX_TTL_SECS {
            return invalid("cache lifetimes must not exceed one year");
        }
        if self.cache.operation_timeout_ms == 0 {
            return invalid("cache.operation_timeout_ms must be positive");
        }
        if self.pipeline.resolve_timeout_ms == 0 || self.graph.timeout_ms == 0 {
            return invalid("timeouts must be positive");
        }
        if [
            self.cache.operation_timeout_ms,
            self.pipeline.resolve_timeout_ms,
            self.graph.timeout_ms,
        ]
        .iter()
        .any(|&ms| ms > MAX_TIMEOUT_MS)
        {
            return invalid("timeouts must not exceed one hour");
        }
        if self.breaker.max_cooldown_secs > MAX_TTL_SECS {
            return invalid("breaker.max_cooldown_secs must not exceed one year");
        }
        if self.graph.node_budget == 0 {
            return invalid("graph.node_budget must be positive");
        }
        if self.breaker.failure_threshold == 0 || self.egress.failure_threshold == 0 {
            return invalid("failure thresholds must be positive");
        }
        if self.breaker.backoff_multiplier < 1.0 {
            return invalid("breaker.backoff_multiplier must be at least 1");
        }
        if self.detectors.virtual_seat_threshold == 0
            || self.detectors.associate_overload_threshold == 0
        {
            return invalid("detector thresholds must be positive");
        }
        if self.detectors.max_score <= 0.0 {
            return invalid("detectors.max_score must be positive");
        }
        if let Some((tier, _)) = self
            .tiers
            .iter()
            .find(|(_, limits)| limits.burst_capacity == 0)
        {
            return Err(Error::InvalidConfigValue(format!(
                "tier '{}' has zero burst capacity",
                tier
            )));
        }
        Ok(())
    }
}
