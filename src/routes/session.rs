use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::Deserialize;

use crate::adaptive::{LearnerHistory, RawEmotionEvent};
use crate::middleware::auth::LearnerId;
use crate::response::{ok, AppError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/events", post(session_event))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionEventRequest {
    #[serde(flatten)]
    event: RawEmotionEvent,
    #[serde(default)]
    history: LearnerHistory,
}

async fn session_event(
    State(state): State<AppState>,
    Extension(learner): Extension<LearnerId>,
    Json(payload): Json<SessionEventRequest>,
) -> Result<impl IntoResponse, AppError> {
    let update = state
        .engine()
        .session_update(
            learner.as_str(),
            &payload.event,
            &payload.history,
            state.catalog(),
            state.catalog_timeout(),
        )
        .await?;
    Ok(ok(update))
}
