use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::adaptive::{Feedback, LearnerHistory, ReasonCode, Recommendation};
use crate::middleware::auth::LearnerId;
use crate::response::{ok, AppError};
use crate::routes::require_state;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(recommend))
        .route("/feedback", post(feedback))
        .route("/feedback/summary", get(feedback_summary))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendRequest {
    #[serde(default)]
    history: LearnerHistory,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RecommendResponse {
    recommendations: Vec<Recommendation>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FeedbackResponse {
    recorded: bool,
    reason_code: ReasonCode,
}

async fn recommend(
    State(state): State<AppState>,
    Extension(learner): Extension<LearnerId>,
    Json(payload): Json<RecommendRequest>,
) -> Result<impl IntoResponse, AppError> {
    let summary = require_state(&state, &learner)?;
    let recommendations = state
        .engine()
        .recommend_for(
            learner.as_str(),
            &summary,
            &payload.history,
            state.catalog(),
            state.catalog_timeout(),
        )
        .await?;
    Ok(ok(RecommendResponse { recommendations }))
}

async fn feedback(
    State(state): State<AppState>,
    Extension(learner): Extension<LearnerId>,
    Json(payload): Json<Feedback>,
) -> Result<impl IntoResponse, AppError> {
    let reason_code = state.engine().record_feedback(learner.as_str(), payload)?;
    Ok(ok(FeedbackResponse {
        recorded: true,
        reason_code,
    }))
}

async fn feedback_summary(
    State(state): State<AppState>,
    Extension(learner): Extension<LearnerId>,
) -> impl IntoResponse {
    ok(state.engine().feedback_summary(learner.as_str()))
}
