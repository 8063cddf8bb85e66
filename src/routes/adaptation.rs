use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Extension, Json, Router};
use serde::{Deserialize, Serialize};

use crate::adaptive::{AdaptationAdvice, EmotionalStateSummary, LearnerHistory};
use crate::middleware::auth::LearnerId;
use crate::response::{ok, AppError};
use crate::routes::require_state;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(advise))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdaptationRequest {
    #[serde(default)]
    history: Option<LearnerHistory>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdaptationResponse {
    state: EmotionalStateSummary,
    advice: AdaptationAdvice,
}

/// Advice without a history skips ranking and the success-rate difficulty
/// step, so a switch-topic decision carries no suggested content.
async fn advise(
    State(state): State<AppState>,
    Extension(learner): Extension<LearnerId>,
    Json(payload): Json<AdaptationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let summary = require_state(&state, &learner)?;
    let engine = state.engine();

    let history = payload.history;
    let top = match history.as_ref() {
        Some(history) => match engine
            .recommend_for(
                learner.as_str(),
                &summary,
                history,
                state.catalog(),
                state.catalog_timeout(),
            )
            .await
        {
            Ok(recommendations) => recommendations.into_iter().next(),
            Err(err) => {
                tracing::warn!(
                    learner_id = learner.as_str(),
                    error = %err,
                    "advising without recommendations"
                );
                None
            }
        },
        None => None,
    };

    let advice = engine.advise(&summary, top.as_ref(), history.as_ref());
    Ok(ok(AdaptationResponse {
        state: summary,
        advice,
    }))
}
