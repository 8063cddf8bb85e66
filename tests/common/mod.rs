#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use emolearn_backend::adaptive::AdaptiveConfig;
use emolearn_backend::config::Config;

pub const LEARNER: &str = "learner-1";

pub fn create_test_app() -> Router {
    create_test_app_with(AdaptiveConfig::default())
}

pub fn create_test_app_with(engine_config: AdaptiveConfig) -> Router {
    let state = emolearn_backend::build_state(Config::default(), engine_config)
        .expect("default configuration is valid");
    emolearn_backend::create_app(state)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    learner: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(learner) = learner {
        builder = builder.header("X-Learner-Id", learner);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

pub fn sample_catalog() -> Value {
    serde_json::json!({
        "items": [
            {
                "id": "calm-video",
                "title": "Gentle intro to fractions",
                "contentType": "video",
                "difficulty": "beginner",
                "tags": ["math", "fractions"],
                "cognitiveLoad": 0.2
            },
            {
                "id": "fraction-drill",
                "title": "Fraction drill",
                "kind": "exercise",
                "contentType": "exercise",
                "difficulty": "intermediate",
                "tags": ["math"],
                "cognitiveLoad": 0.8
            },
            {
                "id": "poetry-quiz",
                "title": "Poetry quiz",
                "contentType": "quiz",
                "difficulty": "advanced",
                "tags": ["literature"],
                "cognitiveLoad": 0.6,
                "prerequisites": ["poetry-basics"]
            }
        ]
    })
}
