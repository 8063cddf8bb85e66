use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Serialize;

use crate::adaptive::RawEmotionEvent;
use crate::middleware::auth::LearnerId;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(ingest))
        .route("/state", get(current_state).delete(reset_state))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetResponse {
    cleared: bool,
}

async fn ingest(
    State(state): State<AppState>,
    Extension(learner): Extension<LearnerId>,
    Json(event): Json<RawEmotionEvent>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state.engine().ingest(learner.as_str(), &event)?;
    Ok(ok(summary))
}

async fn current_state(
    State(state): State<AppState>,
    Extension(learner): Extension<LearnerId>,
) -> Result<impl IntoResponse, AppError> {
    let summary = state
        .engine()
        .current_state(learner.as_str())
        .ok_or_else(|| AppError::not_found("no emotional state recorded"))?;
    Ok(ok(summary))
}

async fn reset_state(
    State(state): State<AppState>,
    Extension(learner): Extension<LearnerId>,
) -> impl IntoResponse {
    let cleared = state.engine().reset(learner.as_str());
    tracing::info!(learner_id = learner.as_str(), cleared, "emotion window reset");
    ok(ResetResponse { cleared })
}
