//! Provider registry module.
//!
//! This module provides the resilience controls around live acquisition:
//! - Circuit breaking per provider
//! - Token-bucket rate limiting (per provider, and reusable for caller tiers)
//! - Egress route rotation with health tracking
//! - The `ProviderRegistry` that applies all of them to adapter calls

mod circuit_breaker;
mod egress;
mod rate_limiter;
mod registry;

pub use circuit_breaker::{
    CallPermit, CircuitBreaker, CircuitBreakerConfig, CircuitMetrics, CircuitState,
};
pub use egress::{EgressError, EgressPool, HttpRouteProbe, Route, RouteHealth, RouteProbe};
pub use rate_limiter::{BucketStats, RateLimitConfig, RateLimited, RateLimiter};
pub use registry::{ProviderHealth, ProviderRegistry, RegistryHealth};
