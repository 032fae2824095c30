//! Risk graph: construction, detectors and scoring.
//!
//! ```text
//! root record ──> GraphBuilder ──> ResultGraph ──> RiskScorer ──> scored ResultGraph
//!                     │                                │
//!               EntitySource                 RiskDetector × 5
//!           (resolution pipeline)
//! ```
//!
//! Nodes are stored in a flat table keyed by deterministic ids (see
//! [`node_id`]); edges reference nodes by id.

pub mod detectors;
mod graph_builder;
mod graph_model;
pub mod node_id;
mod scoring;

pub use graph_builder::{EntitySource, GraphBuilder};
pub use graph_model::*;
pub use scoring::RiskScorer;
