mod adaptation;
mod catalog;
mod emotions;
mod health;
mod recommendations;
mod session;

use axum::http::StatusCode;
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;

use crate::adaptive::EmotionalStateSummary;
use crate::middleware::auth::{require_learner, LearnerId};
use crate::response::{json_error, AppError};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let enable_catalog_admin = env_bool("ENABLE_CATALOG_ADMIN").unwrap_or(true);
    let healthcheck_endpoint = normalize_healthcheck_endpoint(
        std::env::var("HEALTHCHECK_ENDPOINT")
            .ok()
            .as_deref()
            .unwrap_or("/health"),
    );

    let mut api = Router::new()
        .nest("/emotions", emotions::router())
        .nest("/recommendations", recommendations::router())
        .nest("/adaptation", adaptation::router())
        .nest("/session", session::router());
    if enable_catalog_admin {
        api = api.nest("/catalog", catalog::router());
    }

    let mut app = Router::new().nest("/api", api.layer(middleware::from_fn(require_learner)));

    app = app.nest("/health", health::router());
    if healthcheck_endpoint != "/health" {
        app = app.nest(healthcheck_endpoint.as_str(), health::router());
    }

    app.fallback(fallback_handler).with_state(state)
}

pub(crate) fn require_state(
    state: &AppState,
    learner: &LearnerId,
) -> Result<EmotionalStateSummary, AppError> {
    state
        .engine()
        .current_state(learner.as_str())
        .ok_or_else(|| {
            json_error(
                StatusCode::NOT_FOUND,
                "NO_EMOTIONAL_STATE",
                "no emotional state recorded for learner",
            )
        })
}

fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn normalize_healthcheck_endpoint(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return "/health".to_string();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

async fn fallback_handler() -> Response {
    json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "route not found").into_response()
}
