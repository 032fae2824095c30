use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get},
    Json, Router,
};
use nexus_core::history::SearchRecord;
use nexus_core::ResultGraph;
use nexus_registry::Country;
use serde::Deserialize;

use super::CALLER_TIER_HEADER;
use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

const DEFAULT_TIER: &str = "free";

const DEFAULT_HISTORY_LIMIT: usize = 100;
const MAX_HISTORY_LIMIT: usize = 1_000;

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
}

#[derive(Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
    country: Option<String>,
}

fn caller_tier(headers: &HeaderMap) -> String {
    headers
        .get(CALLER_TIER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_TIER.to_string())
}

fn required_query(query: SearchQuery) -> ApiResult<String> {
    query
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query parameter 'q' is required".to_string()))
}

async fn search(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<ResultGraph>> {
    let raw = required_query(query)?;
    let tier = caller_tier(&headers);
    let graph = state
        .risk_graph_service
        .resolve_entity(&raw, &tier)
        .await?;
    Ok(Json(graph))
}

async fn invalidate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<StatusCode> {
    let raw = required_query(query)?;
    state.risk_graph_service.invalidate_graph(&raw).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn history_country(raw: Option<&str>) -> ApiResult<Option<Country>> {
    match raw.map(str::trim).filter(|c| !c.is_empty()) {
        None => Ok(None),
        Some(code) => Country::from_code(code)
            .map(Some)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown country: {}", code))),
    }
}

async fn history(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<Vec<SearchRecord>>> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let country = history_country(query.country.as_deref())?;
    let searches = state
        .risk_graph_service
        .get_search_history(limit, country)
        .await?;
    Ok(Json(searches))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/search", get(search))
        .route("/search/history", get(history))
        .route("/graphs", delete(invalidate))
}
