//! Companies winding down, and the companies linked to them.

use std::collections::BTreeSet;

use nexus_registry::EntityStatus;

use super::{DetectorContext, RiskDetector};
use crate::graph::graph_model::{DetectorKind, Finding};

pub struct LiquidationDetector;

impl RiskDetector for LiquidationDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Liquidation
    }

    fn run(&self, ctx: &DetectorContext<'_>) -> Vec<Finding> {
        let settings = ctx.settings;
        let mut findings = Vec::new();
        let mut linked: BTreeSet<(&str, &str)> = BTreeSet::new();

        for company in ctx.graph.companies() {
            let state = match company.company_status() {
                Some(EntityStatus::Liquidation) => "in liquidation",
                Some(EntityStatus::Dissolved) => "dissolved",
                _ => continue,
            };
            findings.push(Finding {
                detector: DetectorKind::Liquidation,
                company: company.id.clone(),
                contribution: settings.liquidation_weight,
                path: None,
                message: format!("{} is {}", company.label, state),
            });

            // Companies holding, holding shares in, or managing the terminal one.
            let neighbours = ctx
                .incoming(&company.id)
                .filter(|edge| edge.kind.is_control())
                .map(|edge| edge.from.as_str())
                .chain(
                    ctx.outgoing(&company.id)
                        .filter(|edge| edge.kind.is_control())
                        .map(|edge| edge.to.as_str()),
                );
            for neighbour in neighbours {
                if neighbour == company.id {
                    continue;
                }
                if ctx.node(neighbour).is_some_and(|n| n.is_company()) {
                    linked.insert((neighbour, company.id.as_str()));
                }
            }
        }

        if settings.related_liquidation_weight > 0.0 {
            for (neighbour, terminal) in linked {
                let label = ctx.node(terminal).map_or(terminal, |n| n.label.as_str());
                findings.push(Finding {
                    detector: DetectorKind::Liquidation,
                    company: neighbour.to_string(),
                    contribution: settings.related_liquidation_weight,
                    path: Some(vec![neighbour.to_string(), terminal.to_string()]),
                    message: format!("Linked company {} is winding down", label),
                });
            }
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
    use nexus_registry::Country;

    #[test]
    fn test_terminal_company_and_linked_company_flagged() {
        let graph = GraphFixture::new()
            .company("root", Country::Sk, EntityStatus::Active)
            .company("sister", Country::Sk, EntityStatus::Liquidation)
            .company("other", Country::Sk, EntityStatus::Active)
            .edge("root", "sister", EdgeKind::OwnedBy)
            .build();
        let settings = DetectorSettings::default();

        let findings = LiquidationDetector.run(&DetectorContext::new(&graph, &settings));

        assert_eq!(findings.len(), 2);
        let own = findings.iter().find(|f| f.company == "sister").unwrap();
        assert_eq!(own.contribution, settings.liquidation_weight);
        assert!(own.message.contains("liquidation"));
        let linked = findings.iter().find(|f| f.company == "root").unwrap();
        assert_eq!(linked.contribution, settings.related_liquidation_weight);
        assert!(findings.iter().all(|f| f.company != "other"));
    }

    #[test]
    fn test_dissolved_counts_and_active_does_not() {
        let graph = GraphFixture::new()
            .company("gone", Country::Cz, EntityStatus::Dissolved)
            .company("fine", Country::Cz, EntityStatus::Active)
            .build();
        let settings = DetectorSettings::default();

        let findings = LiquidationDetector.run(&DetectorContext::new(&graph, &settings));

        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].company, "gone");
    }

    #[test]
    fn test_related_weight_zero_disables_propagation() {
        let graph = GraphFixture::new()
            .company("root", Country::Sk, EntityStatus::Active)
            .company("sister", Country::Sk, EntityStatus::Liquidation)
            .edge("root", "sister", EdgeKind::ManagedBy)
            .build();
        let settings = DetectorSettings {
            related_liquidation_weight: 0.0,
            ..Default::default()
        };

        let findings = LiquidationDetector.run(&DetectorContext::new(&graph, &settings));
        assert_eq!(findings.len(), 1);
    }
}
