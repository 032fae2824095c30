//! Breadth-first construction of the risk graph.
//!
//! Company associates are resolved level by level (concurrently within a
//! level) up to `max_depth` hops from the root. Beyond that depth they stay
//! as unresolved placeholder nodes. Nodes live in a flat table keyed by
//! their deterministic id; the node budget caps that table.

use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, warn};
use tokio::time::Instant;

use nexus_registry::{Associate, CanonicalRecord, Identifier, Party, ResolutionError};

use super::graph_model::{EdgeKind, GraphEdge, GraphNode, NodeData, OmittedEntity, ResultGraph};
use super::node_id;
use crate::config::GraphSettings;

/// Where the builder gets related entities from.
#[async_trait]
pub trait EntitySource: Send + Sync {
    async fn resolve(&self, identifier: &Identifier) -> Result<CanonicalRecord, ResolutionError>;
}

/// A company associate waiting for its target to be resolved.
struct PendingLink {
    from: String,
    associate: Associate,
    target: Identifier,
}

pub struct GraphBuilder<'a> {
    source: &'a dyn EntitySource,
    settings: &'a GraphSettings,
    deadline: Instant,
    nodes: BTreeMap<String, GraphNode>,
    edges: Vec<GraphEdge>,
    edge_keys: HashSet<(String, String, EdgeKind)>,
    /// Identifier keys already resolved or queued for resolution.
    visited: HashSet<String>,
    omitted: Vec<OmittedEntity>,
    truncated: bool,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(
        source: &'a dyn EntitySource,
        settings: &'a GraphSettings,
        deadline: Instant,
    ) -> Self {
        Self {
            source,
            settings,
            deadline,
            nodes: BTreeMap::new(),
            edges: Vec::new(),
            edge_keys: HashSet::new(),
            visited: HashSet::new(),
            omitted: Vec::new(),
            truncated: false,
        }
    }

    /// Build the graph around an already resolved root. Scores are left at
    /// zero; see [`super::RiskScorer`].
    pub async fn build(mut self, root: CanonicalRecord) -> ResultGraph {
        let root_identifier = root.identifier.clone();
        let root_node = node_id::company_id(&root_identifier);
        self.visited.insert(root_identifier.key());

        let mut frontier = vec![root];
        let mut depth = 0;

        while !frontier.is_empty() {
            let mut pending = Vec::new();
            for record in &frontier {
                self.add_record(record, depth, &mut pending);
            }
            if pending.is_empty() {
                break;
            }
            frontier = self.resolve_pending(pending).await;
            depth += 1;
        }

        ResultGraph {
            root: root_identifier,
            root_node,
            nodes: self.nodes.into_values().collect(),
            edges: self.edges,
            headline_score: 0.0,
            partial: !self.omitted.is_empty(),
            truncated: self.truncated,
            omitted: self.omitted,
            findings: Vec::new(),
            generated_at: Utc::now(),
        }
    }

    /// Add a resolved record's own facts and queue its company associates.
    fn add_record(
        &mut self,
        record: &CanonicalRecord,
        depth: usize,
        pending: &mut Vec<PendingLink>,
    ) {
        let company = node_id::company_id(&record.identifier);
        if !self.upsert_node(resolved_company(record)) {
            return;
        }

        if let Some(address) = &record.registered_address {
            let address_node = GraphNode {
                id: node_id::address_id(address),
                label: address.text.clone(),
                country: Some(address.country),
                risk_score: 0.0,
                data: NodeData::Address {
                    postal_code: address.postal_code.clone(),
                    city: address.city.clone(),
                },
            };
            let target = address_node.id.clone();
            if self.upsert_node(address_node) {
                self.add_edge(&company, &target, EdgeKind::LocatedAt, None);
            }
        }

        if let Some(debt) = record.outstanding_debt() {
            let debt_node = GraphNode {
                id: node_id::debt_id(&record.identifier),
                label: format!("{} {}", debt.amount, debt.currency),
                country: Some(record.country),
                risk_score: 0.0,
                data: NodeData::Debt {
                    amount: debt.amount,
                    currency: debt.currency.clone(),
                },
            };
            let target = debt_node.id.clone();
            if self.upsert_node(debt_node) {
                self.add_edge(&company, &target, EdgeKind::HasDebt, None);
            }
        }

        for associate in &record.associates {
            match &associate.party {
                Party::Person { person_id, country } => {
                    let person = GraphNode {
                        id: node_id::person_id(person_id),
                        label: associate.name.clone(),
                        country: *country,
                        risk_score: 0.0,
                        data: NodeData::Person {
                            person_id: person_id.clone(),
                        },
                    };
                    let target = person.id.clone();
                    if self.upsert_node(person) {
                        let kind = EdgeKind::for_role(associate.role);
                        self.add_edge(&company, &target, kind, Some(associate));
                    }
                }
                Party::Company { identifier } => {
                    let target = node_id::company_id(identifier);
                    if self.nodes.contains_key(&target) {
                        let kind = EdgeKind::for_role(associate.role);
                        self.add_edge(&company, &target, kind, Some(associate));
                    } else if depth < self.settings.max_depth {
                        pending.push(PendingLink {
                            from: company.clone(),
                            associate: associate.clone(),
                            target: identifier.clone(),
                        });
                    } else if self.upsert_node(placeholder_company(associate, identifier)) {
                        let kind = EdgeKind::for_role(associate.role);
                        self.add_edge(&company, &target, kind, Some(associate));
                    }
                }
            }
        }
    }

    /// Resolve the distinct targets of `pending` concurrently and link the
    /// ones that resolved. Returns the newly resolved records.
    async fn resolve_pending(&mut self, pending: Vec<PendingLink>) -> Vec<CanonicalRecord> {
        let remaining = self.settings.node_budget.saturating_sub(self.nodes.len());
        let mut targets = Vec::new();
        for link in &pending {
            let key = link.target.key();
            if self.visited.contains(&key) {
                continue;
            }
            if targets.len() >= remaining {
                self.truncated = true;
                continue;
            }
            self.visited.insert(key);
            targets.push(link.target.clone());
        }

        let source = self.source;
        let lookups = targets.iter().map(|target| source.resolve(target));
        let settled =
            tokio::time::timeout_at(self.deadline, futures::future::join_all(lookups)).await;
        let outcomes = match settled {
            Ok(outcomes) => outcomes,
            Err(_) => {
                warn!(
                    "Graph deadline reached with {} entities unresolved",
                    targets.len()
                );
                for target in targets {
                    self.omit(target, "graph deadline reached".to_string());
                }
                return Vec::new();
            }
        };

        let mut resolved: HashMap<String, CanonicalRecord> = HashMap::new();
        for (target, outcome) in targets.into_iter().zip(outcomes) {
            match outcome {
                Ok(record) => {
                    resolved.insert(node_id::company_id(&target), record);
                }
                Err(e) => {
                    debug!("Omitting {} from graph: {}", target, e);
                    self.omit(target, e.to_string());
                }
            }
        }

        let mut frontier = Vec::new();
        for link in pending {
            let target = node_id::company_id(&link.target);
            if let Some(record) = resolved.remove(&target) {
                if !self.upsert_node(resolved_company(&record)) {
                    continue;
                }
                frontier.push(record);
            }
            if self.nodes.contains_key(&target) {
                self.add_edge(
                    &link.from,
                    &target,
                    EdgeKind::for_role(link.associate.role),
                    Some(&link.associate),
                );
            }
        }
        frontier
    }

    fn omit(&mut self, identifier: Identifier, reason: String) {
        self.omitted.push(OmittedEntity { identifier, reason });
    }

    /// Insert a node, or enrich an existing one. Returns whether the node is
    /// in the table afterwards.
    fn upsert_node(&mut self, node: GraphNode) -> bool {
        if let Some(existing) = self.nodes.get_mut(&node.id) {
            // A resolved company replaces its placeholder.
            if matches!(node.data, NodeData::Company { status: Some(_), .. }) {
                *existing = node;
            }
            return true;
        }
        if self.nodes.len() >= self.settings.node_budget {
            if !self.truncated {
                debug!("Node budget of {} reached", self.settings.node_budget);
            }
            self.truncated = true;
            return false;
        }
        self.nodes.insert(node.id.clone(), node);
        true
    }

    fn add_edge(&mut self, from: &str, to: &str, kind: EdgeKind, associate: Option<&Associate>) {
        if !self.edge_keys.insert((from.to_string(), to.to_string(), kind)) {
            return;
        }
        self.edges.push(GraphEdge {
            from: from.to_string(),
            to: to.to_string(),
            kind,
            role: associate.map(|a| a.role),
            share_pct: associate.and_then(|a| a.share_pct),
        });
    }
}

fn resolved_company(record: &CanonicalRecord) -> GraphNode {
    GraphNode {
        id: node_id::company_id(&record.identifier),
        label: record.legal_name.clone(),
        country: Some(record.country),
        risk_score: 0.0,
        data: NodeData::Company {
            identifier: record.identifier.clone(),
            status: Some(record.status),
            legal_form: record.legal_form.clone(),
        },
    }
}

fn placeholder_company(associate: &Associate, identifier: &Identifier) -> GraphNode {
    GraphNode {
        id: node_id::company_id(identifier),
        label: associate.name.clone(),
        country: Some(identifier.country),
        risk_score: 0.0,
        data: NodeData::Company {
            identifier: identifier.clone(),
            status: None,
            legal_form: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nexus_registry::{Address, AssociateRole, Country, EntityStatus, Money, TaxFlags};
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Source answering from a fixed table; anything else is NotFound.
    #[derive(Default)]
    struct TableSource {
        records: Mutex<HashMap<String, CanonicalRecord>>,
        calls: AtomicUsize,
        delay: Duration,
    }

    impl TableSource {
        fn with(records: Vec<CanonicalRecord>) -> Self {
            let source = Self::default();
            for record in records {
                source
                    .records
                    .lock()
                    .unwrap()
                    .insert(record.identifier.key(), record);
            }
            source
        }
    }

    #[async_trait]
    impl EntitySource for TableSource {
        async fn resolve(
            &self,
            identifier: &Identifier,
        ) -> Result<CanonicalRecord, ResolutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.records
                .lock()
                .unwrap()
                .get(&identifier.key())
                .cloned()
                .ok_or_else(|| ResolutionError::NotFound {
                    identifier: identifier.key(),
                })
        }
    }

    fn sk(value: &str) -> Identifier {
        Identifier::registration(Country::Sk, value)
    }

    fn company(value: &str) -> CanonicalRecord {
        CanonicalRecord {
            identifier: sk(value),
            legal_name: format!("Firma {}", value),
            country: Country::Sk,
            status: EntityStatus::Active,
            registered_address: Some(Address {
                text: "Hlavná 1, 811 01 Bratislava".to_string(),
                postal_code: Some("811 01".to_string()),
                city: Some("Bratislava".to_string()),
                country: Country::Sk,
            }),
            associates: Vec::new(),
            tax_flags: TaxFlags::default(),
            legal_form: None,
            founded_on: None,
            terminated_on: None,
            source_provider: "SK_RPO".to_string(),
            fetched_at: Utc::now(),
        }
    }

    fn owner_company(value: &str) -> Associate {
        Associate {
            name: format!("Firma {}", value),
            role: AssociateRole::Owner,
            share_pct: Some(dec!(100)),
            party: Party::Company {
                identifier: sk(value),
            },
        }
    }

    fn manager(name: &str) -> Associate {
        Associate {
            name: name.to_string(),
            role: AssociateRole::Manager,
            share_pct: None,
            party: Party::Person {
                person_id: format!("sk:{}", name.to_lowercase()),
                country: Some(Country::Sk),
            },
        }
    }

    fn settings(max_depth: usize, node_budget: usize) -> GraphSettings {
        GraphSettings {
            max_depth,
            node_budget,
            timeout_ms: 45_000,
        }
    }

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(60)
    }

    #[tokio::test]
    async fn test_root_facts_become_nodes_and_edges() {
        let mut root = company("88888888");
        root.associates.push(manager("Ján Novák"));
        root.tax_flags.debt_amount = Some(Money {
            amount: dec!(25000),
            currency: "EUR".to_string(),
        });

        let source = TableSource::default();
        let config = settings(2, 60);
        let graph = GraphBuilder::new(&source, &config, far_deadline()).build(root).await;

        assert_eq!(graph.nodes.len(), 4);
        assert_eq!(graph.edges_of_kind(EdgeKind::LocatedAt).count(), 1);
        assert_eq!(graph.edges_of_kind(EdgeKind::HasDebt).count(), 1);
        assert_eq!(graph.edges_of_kind(EdgeKind::ManagedBy).count(), 1);
        assert!(graph.node(&graph.root_node).is_some());
        assert!(!graph.partial);
        assert!(!graph.truncated);
    }

    #[tokio::test]
    async fn test_associate_companies_resolved_to_depth() {
        let mut root = company("88888888");
        root.associates.push(owner_company("77777777"));
        let mut parent = company("77777777");
        parent.associates.push(owner_company("66666666"));
        let mut grandparent = company("66666666");
        grandparent.associates.push(owner_company("55555555"));

        let source = TableSource::with(vec![parent, grandparent]);
        let config = settings(2, 60);
        let graph = GraphBuilder::new(&source, &config, far_deadline()).build(root).await;

        // two hops resolved, the third company is a placeholder
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        let placeholder = graph.node(&node_id::company_id(&sk("55555555"))).unwrap();
        assert_eq!(placeholder.company_status(), None);
        let resolved = graph.node(&node_id::company_id(&sk("66666666"))).unwrap();
        assert_eq!(resolved.company_status(), Some(EntityStatus::Active));
        assert_eq!(graph.edges_of_kind(EdgeKind::OwnedBy).count(), 3);
        assert!(!graph.partial);
    }

    #[tokio::test]
    async fn test_shared_associate_resolved_once() {
        let mut root = company("88888888");
        root.associates.push(owner_company("77777777"));
        root.associates.push(Associate {
            role: AssociateRole::Manager,
            ..owner_company("77777777")
        });

        let source = TableSource::with(vec![company("77777777")]);
        let config = settings(2, 60);
        let graph = GraphBuilder::new(&source, &config, far_deadline()).build(root).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(graph.edges_of_kind(EdgeKind::OwnedBy).count(), 1);
        assert_eq!(graph.edges_of_kind(EdgeKind::ManagedBy).count(), 1);
    }

    #[tokio::test]
    async fn test_failed_associate_marks_partial() {
        let mut root = company("88888888");
        root.associates.push(owner_company("77777777"));
        root.associates.push(owner_company("12345678"));

        let source = TableSource::with(vec![company("77777777")]);
        let config = settings(2, 60);
        let graph = GraphBuilder::new(&source, &config, far_deadline()).build(root).await;

        assert!(graph.partial);
        assert_eq!(graph.omitted.len(), 1);
        assert_eq!(graph.omitted[0].identifier, sk("12345678"));
        assert!(graph.node(&node_id::company_id(&sk("12345678"))).is_none());
        assert_eq!(graph.edges_of_kind(EdgeKind::OwnedBy).count(), 1);
    }

    #[tokio::test]
    async fn test_node_budget_truncates() {
        let mut root = company("88888888");
        for i in 0..10 {
            root.associates.push(manager(&format!("Osoba {}", i)));
        }

        let source = TableSource::default();
        let config = settings(2, 5);
        let graph = GraphBuilder::new(&source, &config, far_deadline()).build(root).await;

        assert_eq!(graph.nodes.len(), 5);
        assert!(graph.truncated);
        assert!(!graph.partial);
        // every edge has both ends in the table
        for edge in &graph.edges {
            assert!(graph.node(&edge.from).is_some());
            assert!(graph.node(&edge.to).is_some());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_omits_unresolved_level() {
        let mut root = company("88888888");
        root.associates.push(owner_company("77777777"));

        let source = TableSource {
            delay: Duration::from_secs(10),
            ..TableSource::with(vec![company("77777777")])
        };
        let config = settings(2, 60);
        let deadline = Instant::now() + Duration::from_secs(1);
        let graph = GraphBuilder::new(&source, &config, deadline).build(root).await;

        assert!(graph.partial);
        assert_eq!(graph.omitted[0].reason, "graph deadline reached");
        assert!(graph.node(&node_id::company_id(&sk("77777777"))).is_none());
    }

    #[tokio::test]
    async fn test_depth_zero_keeps_associates_as_placeholders() {
        let mut root = company("88888888");
        root.associates.push(owner_company("77777777"));

        let source = TableSource::with(vec![company("77777777")]);
        let config = settings(0, 60);
        let graph = GraphBuilder::new(&source, &config, far_deadline()).build(root).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
        let node = graph.node(&node_id::company_id(&sk("77777777"))).unwrap();
        assert_eq!(node.company_status(), None);
    }
}
