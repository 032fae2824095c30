//! Nexus Core - resolution pipeline, risk graph and engine services.
//!
//! This crate turns a raw registry query into a scored risk graph. It owns
//! the engine configuration, the fast-cache and durable-store contracts, the
//! resolution pipeline in front of `nexus-registry`, the graph builder with
//! its detectors, and the search history contract. Storage backends implement
//! [`store::RecordStore`] and [`history::SearchHistoryRepository`] in their
//! own crates.

pub mod cache;
pub mod config;
pub mod errors;
pub mod graph;
pub mod history;
pub mod resolution;
pub mod service;
pub mod store;

pub use config::EngineConfig;
pub use graph::ResultGraph;
pub use resolution::ResolutionPipeline;
pub use service::{RiskGraphService, RiskGraphServiceTrait};

// Re-export error types
pub use errors::Error;
pub use errors::Result;
