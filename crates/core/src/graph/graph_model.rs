//! Risk graph domain models.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use nexus_registry::{AssociateRole, Country, EntityStatus, Identifier};

// =============================================================================
// Nodes
// =============================================================================

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Company,
    Person,
    Address,
    Debt,
}

/// Kind-specific node payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeData {
    Company {
        identifier: Identifier,
        /// `None` for companies seen only as an associate (not resolved).
        status: Option<EntityStatus>,
        #[serde(rename = "legalForm")]
        legal_form: Option<String>,
    },
    Person {
        #[serde(rename = "personId")]
        person_id: String,
    },
    Address {
        #[serde(rename = "postalCode")]
        postal_code: Option<String>,
        city: Option<String>,
    },
    Debt {
        amount: Decimal,
        currency: String,
    },
}

impl NodeData {
    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Company { .. } => NodeKind::Company,
            Self::Person { .. } => NodeKind::Person,
            Self::Address { .. } => NodeKind::Address,
            Self::Debt { .. } => NodeKind::Debt,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub country: Option<Country>,
    /// Clamped detector score. Only company nodes are scored.
    pub risk_score: f64,
    #[serde(flatten)]
    pub data: NodeData,
}

impl GraphNode {
    pub fn kind(&self) -> NodeKind {
        self.data.kind()
    }

    pub fn is_company(&self) -> bool {
        self.kind() == NodeKind::Company
    }

    /// Status of a resolved company node.
    pub fn company_status(&self) -> Option<EntityStatus> {
        match &self.data {
            NodeData::Company { status, .. } => *status,
            _ => None,
        }
    }
}

// =============================================================================
// Edges
// =============================================================================

/// Relationship kinds. Every edge points away from a company.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeKind {
    /// company → address
    LocatedAt,
    /// company → manager (person or company)
    ManagedBy,
    /// company → owner (person or company)
    OwnedBy,
    /// company → debt
    HasDebt,
}

impl EdgeKind {
    /// Ownership or management, the relations chains are built from.
    pub fn is_control(&self) -> bool {
        matches!(self, Self::ManagedBy | Self::OwnedBy)
    }

    pub fn for_role(role: AssociateRole) -> Self {
        if role.is_ownership() {
            Self::OwnedBy
        } else {
            Self::ManagedBy
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
    pub role: Option<AssociateRole>,
    pub share_pct: Option<Decimal>,
}

// =============================================================================
// Findings
// =============================================================================

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    Debt,
    Liquidation,
    VirtualSeat,
    AssociateOverload,
    CrossBorder,
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Debt => "debt",
            Self::Liquidation => "liquidation",
            Self::VirtualSeat => "virtual_seat",
            Self::AssociateOverload => "associate_overload",
            Self::CrossBorder => "cross_border",
        };
        f.write_str(name)
    }
}

/// One detector contribution to one company's score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub detector: DetectorKind,
    /// Node id of the company the contribution is attached to.
    pub company: String,
    pub contribution: f64,
    /// Node ids along a flagged chain, starting at `company`.
    pub path: Option<Vec<String>>,
    pub message: String,
}

// =============================================================================
// Result
// =============================================================================

/// A related entity the traversal had to leave out.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OmittedEntity {
    pub identifier: Identifier,
    pub reason: String,
}

/// The answer to one `resolve_entity` call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultGraph {
    pub root: Identifier,
    /// Node id of the root company.
    pub root_node: String,
    /// Sorted by id.
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub headline_score: f64,
    /// Some non-root entity could not be resolved.
    pub partial: bool,
    /// The node budget stopped the traversal.
    pub truncated: bool,
    pub omitted: Vec<OmittedEntity>,
    pub findings: Vec<Finding>,
    pub generated_at: DateTime<Utc>,
}

impl ResultGraph {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes
            .binary_search_by(|node| node.id.as_str().cmp(id))
            .ok()
            .map(|index| &self.nodes[index])
    }

    pub fn companies(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.iter().filter(|node| node.is_company())
    }

    pub fn edges_of_kind(&self, kind: EdgeKind) -> impl Iterator<Item = &GraphEdge> {
        self.edges.iter().filter(move |edge| edge.kind == kind)
    }

    pub fn findings_for(&self, company: &str) -> impl Iterator<Item = &Finding> + '_ {
        let company = company.to_string();
        self.findings
            .iter()
            .filter(move |finding| finding.company == company)
    }
}
