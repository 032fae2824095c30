//! Provider registry for live acquisition.
//!
//! The registry owns the process-wide provider health state and wraps every
//! adapter call with, in order:
//! - the provider's circuit breaker (short-circuit without I/O when open)
//! - the provider's outbound token bucket
//! - egress route selection
//! - the adapter's own per-call timeout
//!
//! Outcomes are recorded centrally; adapters never retry on their own. When
//! several adapters answer for one identifier kind (PL NIP: White List, then
//! CEIDG), a `NotFound` from one falls through to the next.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;

use super::{
    BucketStats, CallPermit, CircuitBreaker, CircuitState, EgressPool, RateLimitConfig, RateLimiter,
    RouteHealth,
};
use crate::errors::{ProviderError, ResolutionError, UnavailableCause};
use crate::models::{CanonicalRecord, Country, Identifier};
use crate::normalizer;
use crate::provider::RegistryProvider;
use crate::router::CountryRouter;

/// Health of one provider, for operational introspection.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderHealth {
    pub provider: String,
    pub country: Country,
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub cooldown_secs: u64,
    /// Seconds left in the current cool-down while Open
    pub retry_after_secs: Option<u64>,
    pub last_state_change: Option<DateTime<Utc>>,
    /// Outbound token bucket level
    pub tokens: f64,
}

/// Health of every provider plus the egress route table.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryHealth {
    pub providers: Vec<ProviderHealth>,
    pub routes: Vec<RouteHealth>,
}

/// Provider registry for resilient live acquisition.
pub struct ProviderRegistry {
    router: CountryRouter,
    circuit_breaker: CircuitBreaker,
    rate_limiter: RateLimiter,
    egress: Arc<EgressPool>,
}

impl ProviderRegistry {
    /// Create a registry over the given adapters.
    ///
    /// Each adapter's declared outbound limit configures its token bucket.
    pub fn new(
        providers: Vec<Arc<dyn RegistryProvider>>,
        circuit_breaker: CircuitBreaker,
        egress: Arc<EgressPool>,
    ) -> Self {
        let rate_limiter = RateLimiter::new();
        for provider in &providers {
            let limit = provider.rate_limit();
            rate_limiter.configure(
                provider.id(),
                RateLimitConfig::new(limit.requests_per_minute, limit.burst),
            );
        }

        Self {
            router: CountryRouter::new(providers),
            circuit_breaker,
            rate_limiter,
            egress,
        }
    }

    /// Router over the registered adapters.
    pub fn router(&self) -> &CountryRouter {
        &self.router
    }

    pub fn egress(&self) -> &Arc<EgressPool> {
        &self.egress
    }

    /// Fetch and normalize one entity.
    ///
    /// Adapters that answer for the identifier are asked in priority order;
    /// a confirmed `NotFound` moves on to the next one, any other outcome is
    /// final.
    pub async fn acquire(
        &self,
        identifier: &Identifier,
    ) -> Result<CanonicalRecord, ResolutionError> {
        let mut outcome = Err(ResolutionError::UnrecognizedIdentifier(
            identifier.to_string(),
        ));
        for provider in self.router.providers_for(identifier) {
            outcome = self.acquire_from(provider.as_ref(), identifier).await;
            match &outcome {
                Err(ResolutionError::NotFound { .. }) => {
                    debug!("'{}' does not know {}", provider.id(), identifier.key());
                }
                _ => break,
            }
        }
        outcome
    }

    /// One adapter call behind that provider's circuit, bucket and an egress route.
    ///
    /// Fails without calling the adapter when the circuit is open, the
    /// provider's outbound bucket is empty, or no egress route is healthy.
    async fn acquire_from(
        &self,
        provider: &dyn RegistryProvider,
        identifier: &Identifier,
    ) -> Result<CanonicalRecord, ResolutionError> {
        let provider_id = provider.id();

        let permit = self
            .circuit_breaker
            .try_acquire(provider_id)
            .map_err(|retry_after| {
                debug!("Circuit open for '{}', short-circuiting", provider_id);
                ResolutionError::CircuitOpen {
                    provider: provider_id.to_string(),
                    retry_after,
                }
            })?;

        if let Err(limited) = self.rate_limiter.try_acquire(provider_id) {
            self.release(provider_id, permit);
            return Err(ResolutionError::RateLimited {
                scope: format!("provider:{}", provider_id),
                retry_after: limited.retry_after,
            });
        }

        let route = match self.egress.next_route() {
            Ok(route) => route,
            Err(e) => {
                self.release(provider_id, permit);
                return Err(e);
            }
        };

        debug!(
            "Acquiring {} from '{}' via route '{}'",
            identifier.key(),
            provider_id,
            route.id()
        );

        let timeout = provider.timeout();
        let outcome = match tokio::time::timeout(timeout, provider.fetch(identifier, &route)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::unavailable(
                provider_id,
                UnavailableCause::Timeout,
                format!("no answer within {:?}", timeout),
            )),
        }
        .and_then(normalizer::normalize);

        match &outcome {
            Ok(_) => {
                self.circuit_breaker.record_success(provider_id);
                self.egress.mark_success(&route);
            }
            Err(e) => {
                if e.counts_as_provider_failure() {
                    warn!("Provider '{}' failed: {}", provider_id, e);
                    self.circuit_breaker.record_failure(provider_id);
                } else {
                    self.circuit_breaker.record_success(provider_id);
                }

                if e.is_route_fault() {
                    self.egress.mark_failure(&route);
                } else {
                    self.egress.mark_success(&route);
                }
            }
        }

        outcome.map_err(ResolutionError::from)
    }

    fn release(&self, provider_id: &str, permit: CallPermit) {
        if permit == CallPermit::Probe {
            self.circuit_breaker.release(provider_id);
        }
    }

    /// Circuit, bucket and route state for every registered provider.
    pub fn health(&self) -> RegistryHealth {
        let providers = self
            .router
            .providers()
            .iter()
            .map(|provider| {
                let metrics = self.circuit_breaker.metrics_for(provider.id());
                ProviderHealth {
                    provider: provider.id().to_string(),
                    country: provider.country(),
                    state: metrics.state,
                    consecutive_failures: metrics.consecutive_failures,
                    cooldown_secs: metrics.cooldown.as_secs(),
                    retry_after_secs: metrics.retry_after.map(|d| d.as_secs()),
                    last_state_change: metrics.last_state_change,
                    tokens: self.rate_limiter.remaining_tokens(provider.id()),
                }
            })
            .collect();

        RegistryHealth {
            providers,
            routes: self.egress.snapshot(),
        }
    }

    /// Outbound token buckets, one per provider.
    pub fn outbound_buckets(&self) -> Vec<BucketStats> {
        self.rate_limiter.stats()
    }

    /// Reset one provider's circuit and outbound bucket.
    ///
    /// Returns `false` for an unknown provider id.
    pub fn reset_provider(&self, provider_id: &str) -> bool {
        let Some(provider) = self
            .router
            .providers()
            .iter()
            .find(|p| p.id().eq_ignore_ascii_case(provider_id))
        else {
            return false;
        };

        self.circuit_breaker.reset(provider.id());
        self.rate_limiter.reset(provider.id());
        info!("Provider '{}' reset by operator", provider.id());
        true
    }

    /// Reset every circuit, bucket and egress route.
    pub fn reset_all(&self) {
        self.circuit_breaker.reset_all();
        self.rate_limiter.reset_all();
        self.egress.reset();
        info!("All providers reset by operator");
    }
}
