//! Property-based tests for graph scoring and node identity.
//!
//! Graphs are generated directly (no resolution) so that the detectors see
//! arbitrary mixes of statuses, debts, shared seats and ownership chains.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use nexus_core::config::DetectorSettings;
use nexus_core::graph::{
    node_id, DetectorKind, EdgeKind, GraphEdge, GraphNode, NodeData, ResultGraph, RiskScorer,
};
use nexus_registry::{Address, Country, EntityStatus, Identifier};

// =============================================================================
// Generators
// =============================================================================

fn arb_status() -> impl Strategy<Value = EntityStatus> {
    prop_oneof![
        4 => Just(EntityStatus::Active),
        1 => Just(EntityStatus::Liquidation),
        1 => Just(EntityStatus::Dissolved),
    ]
}

fn arb_country() -> impl Strategy<Value = Country> {
    prop_oneof![
        Just(Country::Sk),
        Just(Country::Cz),
        Just(Country::Pl),
        Just(Country::Hu),
    ]
}

#[derive(Clone, Debug)]
struct CompanyShape {
    country: Country,
    status: EntityStatus,
    has_debt: bool,
    at_seat: bool,
}

fn arb_company() -> impl Strategy<Value = CompanyShape> {
    (arb_country(), arb_status(), any::<bool>(), any::<bool>()).prop_map(
        |(country, status, has_debt, at_seat)| CompanyShape {
            country,
            status,
            has_debt,
            at_seat,
        },
    )
}

/// Companies plus ownership pairs (indices into the company list).
fn arb_graph() -> impl Strategy<Value = (Vec<CompanyShape>, Vec<(usize, usize)>)> {
    proptest::collection::vec(arb_company(), 1..14).prop_flat_map(|companies| {
        let n = companies.len();
        let owners = proptest::collection::vec((0..n, 0..n), 0..n * 2);
        (Just(companies), owners)
    })
}

// =============================================================================
// Graph assembly
// =============================================================================

const SEAT_ID: &str = "address:seat";

fn identifier(index: usize) -> Identifier {
    Identifier::registration(Country::Sk, format!("{:08}", 30_000_000 + index))
}

fn assemble(companies: &[CompanyShape], owners: &[(usize, usize)]) -> ResultGraph {
    let mut nodes = vec![GraphNode {
        id: SEAT_ID.to_string(),
        label: "Hlavná 1, Košice".to_string(),
        country: Some(Country::Sk),
        risk_score: 0.0,
        data: NodeData::Address {
            postal_code: None,
            city: Some("Košice".to_string()),
        },
    }];
    let mut edges = Vec::new();

    for (index, shape) in companies.iter().enumerate() {
        let id = format!("company:{:04}", index);
        nodes.push(GraphNode {
            id: id.clone(),
            label: format!("Company {}", index),
            country: Some(shape.country),
            risk_score: 0.0,
            data: NodeData::Company {
                identifier: identifier(index),
                status: Some(shape.status),
                legal_form: None,
            },
        });
        if shape.at_seat {
            edges.push(edge(&id, SEAT_ID, EdgeKind::LocatedAt));
        }
        if shape.has_debt {
            let debt = format!("debt:{:04}", index);
            nodes.push(GraphNode {
                id: debt.clone(),
                label: "1200 EUR".to_string(),
                country: Some(shape.country),
                risk_score: 0.0,
                data: NodeData::Debt {
                    amount: Decimal::from(1200),
                    currency: "EUR".to_string(),
                },
            });
            edges.push(edge(&id, &debt, EdgeKind::HasDebt));
        }
    }
    for &(owned, owner) in owners {
        if owned != owner {
            edges.push(edge(
                &format!("company:{:04}", owned),
                &format!("company:{:04}", owner),
                EdgeKind::OwnedBy,
            ));
        }
    }
    edges.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));
    edges.dedup_by(|a, b| a.from == b.from && a.to == b.to && a.kind == b.kind);
    nodes.sort_by(|a, b| a.id.cmp(&b.id));

    ResultGraph {
        root: identifier(0),
        root_node: "company:0000".to_string(),
        nodes,
        edges,
        headline_score: 0.0,
        partial: false,
        truncated: false,
        omitted: Vec::new(),
        findings: Vec::new(),
        generated_at: Utc::now(),
    }
}

fn edge(from: &str, to: &str, kind: EdgeKind) -> GraphEdge {
    GraphEdge {
        from: from.to_string(),
        to: to.to_string(),
        kind,
        role: None,
        share_pct: None,
    }
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Every company score stays within `0..=max_score` and the headline is
    /// the highest of them.
    #[test]
    fn prop_scores_are_clamped((companies, owners) in arb_graph()) {
        let settings = DetectorSettings::default();
        let mut graph = assemble(&companies, &owners);

        RiskScorer::new(settings.clone()).score(&mut graph);

        let mut highest: f64 = 0.0;
        for node in graph.companies() {
            prop_assert!(node.risk_score >= 0.0);
            prop_assert!(node.risk_score <= settings.max_score);
            highest = highest.max(node.risk_score);
        }
        prop_assert_eq!(graph.headline_score, highest);
        prop_assert!(graph.findings.iter().all(|f| graph.node(&f.company).is_some()));
    }

    /// The shared address is flagged exactly when more companies than the
    /// threshold are registered there.
    #[test]
    fn prop_virtual_seat_iff_fan_in_exceeds_threshold((companies, owners) in arb_graph()) {
        let settings = DetectorSettings::default();
        let mut graph = assemble(&companies, &owners);
        let fan_in = companies.iter().filter(|c| c.at_seat).count();

        RiskScorer::new(settings.clone()).score(&mut graph);

        let flagged = graph
            .findings
            .iter()
            .filter(|f| f.detector == DetectorKind::VirtualSeat)
            .count();
        if fan_in > settings.virtual_seat_threshold {
            prop_assert_eq!(flagged, fan_in);
        } else {
            prop_assert_eq!(flagged, 0);
        }
    }

    /// Debts and terminal statuses always leave a finding on their company.
    #[test]
    fn prop_debt_and_status_findings_match_records((companies, owners) in arb_graph()) {
        let mut graph = assemble(&companies, &owners);

        RiskScorer::new(DetectorSettings::default()).score(&mut graph);

        for (index, shape) in companies.iter().enumerate() {
            let id = format!("company:{:04}", index);
            let own = |kind: DetectorKind| {
                graph
                    .findings_for(&id)
                    .any(|f| f.detector == kind && f.path.is_none())
            };
            prop_assert_eq!(own(DetectorKind::Debt), shape.has_debt);
            prop_assert_eq!(own(DetectorKind::Liquidation), shape.status.is_terminal());
        }
    }

    /// Node ids depend only on the entity, never on call order.
    #[test]
    fn prop_node_ids_are_deterministic(
        value in "[0-9]{8}",
        other in "[0-9]{8}",
        street in "[A-Za-z ]{3,30}",
    ) {
        let first = Identifier::registration(Country::Sk, value.clone());
        let again = Identifier::registration(Country::Sk, value.clone());
        prop_assert_eq!(node_id::company_id(&first), node_id::company_id(&again));
        prop_assert!(node_id::company_id(&first).starts_with("company:"));

        let second = Identifier::registration(Country::Sk, other.clone());
        if value != other {
            prop_assert_ne!(node_id::company_id(&first), node_id::company_id(&second));
        }

        let czech = Identifier::registration(Country::Cz, value);
        prop_assert_ne!(node_id::company_id(&first), node_id::company_id(&czech));

        let address = |text: &str| Address {
            text: text.to_string(),
            postal_code: None,
            city: None,
            country: Country::Sk,
        };
        prop_assert_eq!(
            node_id::address_id(&address(&street)),
            node_id::address_id(&address(&street.to_uppercase()))
        );
    }
}
