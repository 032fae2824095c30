//! Per-company scores and the headline score.

use std::collections::HashMap;

use log::debug;

use super::detectors::{default_detectors, DetectorContext, RiskDetector};
use super::graph_model::ResultGraph;
use crate::config::DetectorSettings;

/// Runs the detectors over a graph and writes the scores back.
pub struct RiskScorer {
    detectors: Vec<Box<dyn RiskDetector>>,
    settings: DetectorSettings,
}

impl RiskScorer {
    pub fn new(settings: DetectorSettings) -> Self {
        Self::with_detectors(settings, default_detectors())
    }

    pub fn with_detectors(
        settings: DetectorSettings,
        detectors: Vec<Box<dyn RiskDetector>>,
    ) -> Self {
        Self {
            detectors,
            settings,
        }
    }

    /// Replace the graph's findings and scores.
    ///
    /// A company's score is the sum of its findings clamped to
    /// `0..=max_score`; the headline is the highest company score.
    pub fn score(&self, graph: &mut ResultGraph) {
        let findings: Vec<_> = {
            let ctx = DetectorContext::new(graph, &self.settings);
            self.detectors
                .iter()
                .flat_map(|detector| {
                    let findings = detector.run(&ctx);
                    if !findings.is_empty() {
                        debug!(
                            "Detector {} produced {} findings",
                            detector.kind(),
                            findings.len()
                        );
                    }
                    findings
                })
                .collect()
        };

        let mut totals: HashMap<&str, f64> = HashMap::new();
        for finding in &findings {
            *totals.entry(finding.company.as_str()).or_default() += finding.contribution;
        }

        let max_score = self.settings.max_score;
        let mut headline: f64 = 0.0;
        for node in graph.nodes.iter_mut().filter(|node| node.is_company()) {
            let total = totals.get(node.id.as_str()).copied().unwrap_or(0.0);
            node.risk_score = total.clamp(0.0, max_score);
            headline = headline.max(node.risk_score);
        }

        graph.headline_score = headline;
        graph.findings = findings;
    }
}
