use std::sync::Arc;

use axum::{routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::main_lib::AppState;

#[derive(Serialize)]
struct Liveness {
    status: &'static str,
    time: DateTime<Utc>,
}

async fn healthz() -> Json<Liveness> {
    Json(Liveness {
        status: "ok",
        time: Utc::now(),
    })
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/health", get(healthz))
}
