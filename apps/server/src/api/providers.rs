use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use nexus_registry::RegistryHealth;

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
};

async fn provider_health(State(state): State<Arc<AppState>>) -> Json<RegistryHealth> {
    Json(state.risk_graph_service.get_provider_health())
}

async fn reset_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.risk_graph_service.reset_provider(&id) {
        tracing::info!("Provider {} reset by operator", id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Unknown provider: {}", id)))
    }
}

async fn reset_all(State(state): State<Arc<AppState>>) -> StatusCode {
    state.risk_graph_service.reset_all_providers();
    tracing::info!("All providers reset by operator");
    StatusCode::NO_CONTENT
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/providers/health", get(provider_health))
        .route("/providers/reset", post(reset_all))
        .route("/providers/{id}/reset", post(reset_provider))
}
