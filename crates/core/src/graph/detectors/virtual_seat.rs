//! Addresses registered to an abnormal number of companies.

use super::{scaled, DetectorContext, RiskDetector};
use crate::graph::graph_model::{DetectorKind, EdgeKind, Finding, NodeKind};

pub struct VirtualSeatDetector;

impl RiskDetector for VirtualSeatDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::VirtualSeat
    }

    fn run(&self, ctx: &DetectorContext<'_>) -> Vec<Finding> {
        let settings = ctx.settings;
        let mut findings = Vec::new();

        for address in ctx.graph.nodes.iter().filter(|n| n.kind() == NodeKind::Address) {
            let companies = ctx.companies_pointing_at(&address.id, &[EdgeKind::LocatedAt]);
            let fan_in = companies.len();
            if fan_in <= settings.virtual_seat_threshold {
                continue;
            }

            let contribution =
                scaled(settings.virtual_seat_weight, fan_in, settings.virtual_seat_max);
            for company in companies {
                findings.push(Finding {
                    detector: DetectorKind::VirtualSeat,
                    company: company.to_string(),
                    contribution,
                    path: Some(vec![company.to_string(), address.id.clone()]),
                    message: format!("{} companies registered at {}", fan_in, address.label),
                });
            }
        }
        findings
    }
}
