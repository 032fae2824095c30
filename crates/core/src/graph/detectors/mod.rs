//! Risk detectors.
//!
//! Each detector inspects the finished graph and emits findings, each one a
//! contribution to a single company node's score. Detectors are independent
//! of each other and of evaluation order.
//!
//! - Debt: outstanding tax debt attached to the company
//! - Liquidation: the company, or a company it is linked to, is winding down
//! - Virtual seat: the company's address hosts too many companies
//! - Associate overload: one of its people sits in too many companies
//! - Cross-border: a control chain from the company leaves its country

mod associate_overload;
mod cross_border;
mod debt;
mod liquidation;
mod virtual_seat;

use std::collections::{BTreeSet, HashMap};

pub use associate_overload::AssociateOverloadDetector;
pub use cross_border::CrossBorderDetector;
pub use debt::DebtDetector;
pub use liquidation::LiquidationDetector;
pub use virtual_seat::VirtualSeatDetector;

use super::graph_model::{DetectorKind, EdgeKind, Finding, GraphEdge, GraphNode, ResultGraph};
use crate::config::DetectorSettings;

/// Read-only view of a graph with adjacency lookups.
pub struct DetectorContext<'a> {
    pub graph: &'a ResultGraph,
    pub settings: &'a DetectorSettings,
    outgoing: HashMap<&'a str, Vec<&'a GraphEdge>>,
    incoming: HashMap<&'a str, Vec<&'a GraphEdge>>,
}

impl<'a> DetectorContext<'a> {
    pub fn new(graph: &'a ResultGraph, settings: &'a DetectorSettings) -> Self {
        let mut outgoing: HashMap<&str, Vec<&GraphEdge>> = HashMap::new();
        let mut incoming: HashMap<&str, Vec<&GraphEdge>> = HashMap::new();
        for edge in &graph.edges {
            outgoing.entry(edge.from.as_str()).or_default().push(edge);
            incoming.entry(edge.to.as_str()).or_default().push(edge);
        }
        Self {
            graph,
            settings,
            outgoing,
            incoming,
        }
    }

    pub fn node(&self, id: &str) -> Option<&'a GraphNode> {
        self.graph.node(id)
    }

    pub fn outgoing(&self, id: &str) -> impl Iterator<Item = &'a GraphEdge> + '_ {
        self.outgoing.get(id).into_iter().flatten().copied()
    }

    pub fn incoming(&self, id: &str) -> impl Iterator<Item = &'a GraphEdge> + '_ {
        self.incoming.get(id).into_iter().flatten().copied()
    }

    /// Distinct company nodes with an edge of one of `kinds` into `id`.
    pub fn companies_pointing_at(&self, id: &str, kinds: &[EdgeKind]) -> BTreeSet<&'a str> {
        self.incoming(id)
            .filter(|edge| kinds.contains(&edge.kind))
            .map(|edge| edge.from.as_str())
            .filter(|from| self.node(from).is_some_and(GraphNode::is_company))
            .collect()
    }
}

/// A graph pass producing score contributions.
pub trait RiskDetector: Send + Sync {
    fn kind(&self) -> DetectorKind;

    fn run(&self, ctx: &DetectorContext<'_>) -> Vec<Finding>;
}

/// All five detectors.
pub fn default_detectors() -> Vec<Box<dyn RiskDetector>> {
    vec![
        Box::new(DebtDetector),
        Box::new(LiquidationDetector),
        Box::new(VirtualSeatDetector),
        Box::new(AssociateOverloadDetector),
        Box::new(CrossBorderDetector),
    ]
}

/// Contribution that grows with `count` and is capped at `max`.
fn scaled(weight: f64, count: usize, max: f64) -> f64 {
    (weight * count as f64).min(max)
}
