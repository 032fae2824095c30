//! Engine entry points.
//!
//! - `RiskGraphService` resolves a raw query into a scored [`crate::graph::ResultGraph`],
//!   records the search, and exposes provider health, statistics and administration
//! - `providers` builds the adapter set and [`nexus_registry::ProviderRegistry`]
//!   from an [`crate::config::EngineConfig`]

pub mod providers;
mod risk_graph_service;
mod service_model;
mod service_traits;

#[cfg(test)]
mod service_tests;

pub use providers::{build_providers, build_registry};
pub use risk_graph_service::RiskGraphService;
pub use service_model::{DatabaseStats, RateLimiterStats};
pub use service_traits::RiskGraphServiceTrait;
