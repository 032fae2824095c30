use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use nexus_core::cache::CacheStats;
use nexus_core::service::{DatabaseStats, RateLimiterStats};
use serde::Serialize;

use crate::{error::ApiResult, main_lib::AppState};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheStatsBody {
    available: bool,
    #[serde(flatten)]
    stats: Option<CacheStats>,
}

async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStatsBody> {
    let stats = state.risk_graph_service.get_cache_stats();
    Json(CacheStatsBody {
        available: stats.is_some(),
        stats,
    })
}

async fn rate_limiter_stats(State(state): State<Arc<AppState>>) -> Json<RateLimiterStats> {
    Json(state.risk_graph_service.get_rate_limiter_stats())
}

async fn database_stats(State(state): State<Arc<AppState>>) -> ApiResult<Json<DatabaseStats>> {
    Ok(Json(state.risk_graph_service.get_database_stats().await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cache/stats", get(cache_stats))
        .route("/rate-limiter/stats", get(rate_limiter_stats))
        .route("/database/stats", get(database_stats))
}
