use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use nexus_registry::{Country, Identifier, ResolutionError};

use crate::graph::ResultGraph;

/// Outcome recorded for a search that produced a graph.
pub const OUTCOME_OK: &str = "ok";

/// Longer queries are cut to this many characters before they are stored.
pub const MAX_QUERY_CHARS: usize = 255;

/// A search about to be written to history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSearch {
    pub query: String,
    /// `None` when no adapter recognized the query.
    pub country: Option<Country>,
    /// Identifier key the query routed to.
    pub identifier: Option<String>,
    pub tier: String,
    /// `ok`, or the code of the error the caller saw.
    pub outcome: String,
    /// Nodes in the returned graph.
    pub result_count: u32,
    pub risk_score: Option<f64>,
    pub searched_at: DateTime<Utc>,
}

impl NewSearch {
    pub fn new(
        query: &str,
        identifier: Option<&Identifier>,
        tier: &str,
        outcome: &Result<ResultGraph, ResolutionError>,
    ) -> Self {
        let (outcome, result_count, risk_score) = match outcome {
            Ok(graph) => (
                OUTCOME_OK.to_string(),
                u32::try_from(graph.nodes.len()).unwrap_or(u32::MAX),
                Some(graph.headline_score),
            ),
            Err(e) => (e.code().to_string(), 0, None),
        };
        Self {
            query: query.trim().chars().take(MAX_QUERY_CHARS).collect(),
            country: identifier.map(|identifier| identifier.country),
            identifier: identifier.map(Identifier::key),
            tier: tier.to_string(),
            outcome,
            result_count,
            risk_score,
            searched_at: Utc::now(),
        }
    }
}

/// A stored search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRecord {
    pub id: i64,
    #[serde(flatten)]
    pub search: NewSearch,
}
