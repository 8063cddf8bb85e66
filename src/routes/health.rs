use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(root))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    start_time: String,
    uptime: u64,
    version: &'static str,
    tracked_learners: usize,
    catalog_items: usize,
}

async fn root(State(state): State<AppState>) -> Json<HealthResponse> {
    let start_time: DateTime<Utc> = state.started_at_system().into();
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        start_time: start_time.to_rfc3339_opts(SecondsFormat::Millis, true),
        uptime: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION"),
        tracked_learners: state.engine().tracked_learners(),
        catalog_items: state.catalog().len(),
    })
}
