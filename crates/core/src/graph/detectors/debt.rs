//! Outstanding tax debt.

use rust_decimal::Decimal;

use super::{DetectorContext, RiskDetector};
use crate::graph::graph_model::{DetectorKind, EdgeKind, Finding, NodeData};

pub struct DebtDetector;

impl RiskDetector for DebtDetector {
    fn kind(&self) -> DetectorKind {
        DetectorKind::Debt
    }

    fn run(&self, ctx: &DetectorContext<'_>) -> Vec<Finding> {
        ctx.graph
            .edges_of_kind(EdgeKind::HasDebt)
            .filter_map(|edge| {
                let NodeData::Debt { amount, currency } = &ctx.node(&edge.to)?.data else {
                    return None;
                };
                (*amount > Decimal::ZERO).then(|| Finding {
                    detector: DetectorKind::Debt,
                    company: edge.from.clone(),
                    contribution: ctx.settings.debt_weight,
                    path: None,
                    message: format!("Outstanding tax debt of {} {}", amount, currency),
                })
            })
            .collect()
    }
}
