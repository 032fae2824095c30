//! Control chains that cross a border.

use std::collections::{HashMap, VecDeque};

use super::{DetectorContext, RiskDetector};
use crate::graph::graph_model::{DetectorKind, Finding};

pub struct CrossBorderDetector;

impl RiskDetector for CrossBorderDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::CrossBorder
    }

    /// For each company, the shortest ownership/management chain leading to
    /// a node in another country is flagged.
    fn run(&self, ctx: &DetectorContext<'_>) -> Vec<Finding> {
        let mut findings = Vec::new();

        for company in ctx.graph.companies() {
            let Some(home) = company.country else {
                continue;
            };

            let mut parents: HashMap<&str, &str> = HashMap::new();
            let mut queue = VecDeque::from([company.id.as_str()]);
            let mut foreign = None;

            while let Some(current) = queue.pop_front() {
                for edge in ctx.outgoing(current).filter(|e| e.kind.is_control()) {
                    let next = edge.to.as_str();
                    if next == company.id || parents.contains_key(next) {
                        continue;
                    }
                    parents.insert(next, current);
                    let Some(node) = ctx.node(next) else {
                        continue;
                    };
                    if node.country.is_some_and(|country| country != home) {
                        foreign = Some(node);
                        break;
                    }
                    if node.is_company() {
                        queue.push_back(next);
                    }
                }
                if foreign.is_some() {
                    break;
                }
            }

            let Some(foreign) = foreign else {
                continue;
            };
            let mut path = vec![foreign.id.clone()];
            let mut cursor = foreign.id.as_str();
            while let Some(&parent) = parents.get(cursor) {
                path.push(parent.to_string());
                cursor = parent;
            }
            path.reverse();

            let countries: Vec<String> = path
                .iter()
                .filter_map(|id| ctx.node(id)?.country)
                .map(|country| country.code().to_string())
                .fold(Vec::new(), |mut seen, code| {
                    if seen.last() != Some(&code) {
                        seen.push(code);
                    }
                    seen
                });

            findings.push(Finding {
                detector: DetectorKind::CrossBorder,
                company: company.id.clone(),
                contribution: ctx.settings.cross_border_weight,
                message: format!(
                    "Control chain of {} crosses {}",
                    company.label,
                    countries.join(" -> ")
                ),
                path: Some(path),
            });
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectorSettings;
    use crate::graph::detectors::test_support::GraphFixture;
    use crate::graph::graph_model::EdgeKind;
    use nexus_registry::{Country, EntityStatus};

    #[test]
    fn test_chain_into_foreign_owner_flagged_with_path() {
        let graph = GraphFixture::new()
            .company("sk1", Country::Sk, EntityStatus::Active)
            .company("sk2", Country::Sk, EntityStatus::Active)
            .company("cz1", Country::Cz, EntityStatus::Active)
            .edge("sk1", "sk2", EdgeKind::OwnedBy)
            .edge("sk2", "cz1", EdgeKind::OwnedBy)
            .build();
        let settings = DetectorSettings::default();

        let findings = CrossBorderDetector.run(&DetectorContext::new(&graph, &settings));

        let sk1 = findings.iter().find(|f| f.company == "sk1").unwrap();
        assert_eq!(
            sk1.path.as_deref(),
            Some(&["sk1".to_string(), "sk2".to_string(), "cz1".to_string()][..])
        );
        assert_eq!(sk1.contribution, settings.cross_border_weight);
        assert!(sk1.message.contains("SK -> CZ"));
        // sk2 has its own one-hop chain; cz1 owns nothing
        assert!(findings.iter().any(|f| f.company == "sk2"));
        assert!(findings.iter().all(|f| f.company != "cz1"));
    }

    #[test]
    fn test_foreign_manager_counts() {
        let graph = GraphFixture::new()
            .company("hu1", Country::Hu, EntityStatus::Active)
            .person("p", Some(Country::Pl))
            .edge("hu1", "p", EdgeKind::ManagedBy)
            .build();
        let settings = DetectorSettings::default();

        let findings = CrossBorderDetector.run(&DetectorContext::new(&graph, &settings));
        assert_eq!(findings.len(), 1);
    }

    #[test]
    fn test_domestic_chain_and_cycles_ignored() {
        let graph = GraphFixture::new()
            .company("a", Country::Sk, EntityStatus::Active)
            .company("b", Country::Sk, EntityStatus::Active)
            .person("p", None)
            .edge("a", "b", EdgeKind::OwnedBy)
            .edge("b", "a", EdgeKind::OwnedBy)
            .edge("b", "p", EdgeKind::ManagedBy)
            .build();
        let settings = DetectorSettings::default();

        assert!(CrossBorderDetector
            .run(&DetectorContext::new(&graph, &settings))
            .is_empty());
    }
}
