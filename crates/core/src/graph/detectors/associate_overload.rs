//! People sitting in an abnormal number of companies ("white horses").

use super::{scaled, DetectorContext, RiskDetector};
use crate::graph::graph_model::{DetectorKind, EdgeKind, Finding, NodeKind};

pub struct AssociateOverloadDetector;

impl RiskDetector for AssociateOverloadDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::AssociateOverload
    }

    /// Fan-out of a person is the number of distinct companies it manages or owns.
    fn run(&self, ctx: &DetectorContext<'_>) -> Vec<Finding> {
        let settings = ctx.settings;
        let mut findings = Vec::new();

        for person in ctx.graph.nodes.iter().filter(|n| n.kind() == NodeKind::Person) {
            let companies =
                ctx.companies_pointing_at(&person.id, &[EdgeKind::ManagedBy, EdgeKind::OwnedBy]);
            let fan_out = companies.len();
            if fan_out <= settings.associate_overload_threshold {
                continue;
            }

            let contribution = scaled(
                settings.associate_overload_weight,
                fan_out,
                settings.associate_overload_max,
            );
            for company in companies {
                findings.push(Finding {
                    detector: DetectorKind::AssociateOverload,
                    company: company.to_string(),
                    contribution,
                    path: Some(vec![company.to_string(), person.id.clone()]),
                    message: format!("{} is attached to {} companies", person.label, fan_out),
                });
            }
        }
        findings
    }
}
