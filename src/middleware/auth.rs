use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::response::json_error;

pub const LEARNER_HEADER: &str = "x-learner-id";

const MAX_LEARNER_ID_LEN: usize = 128;

/// Identity asserted by the upstream gateway; inserted into request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LearnerId(pub String);

impl LearnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn extract_learner_id(headers: &HeaderMap) -> Option<LearnerId> {
    let value = headers.get(LEARNER_HEADER)?.to_str().ok()?.trim();
    if value.is_empty() || value.len() > MAX_LEARNER_ID_LEN {
        return None;
    }
    Some(LearnerId(value.to_string()))
}

pub async fn require_learner(mut req: Request<Body>, next: Next) -> Response {
    let Some(learner) = extract_learner_id(req.headers()) else {
        return json_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "missing learner identity",
        )
        .into_response();
    };

    req.extensions_mut().insert(learner);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn learner_id_is_trimmed() {
        let mut headers = HeaderMap::new();
        headers.insert(LEARNER_HEADER, HeaderValue::from_static("  learner-7 "));
        assert_eq!(
            extract_learner_id(&headers),
            Some(LearnerId("learner-7".to_string()))
        );
    }

    #[test]
    fn blank_or_oversized_ids_are_rejected() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_learner_id(&headers), None);

        headers.insert(LEARNER_HEADER, HeaderValue::from_static("   "));
        assert_eq!(extract_learner_id(&headers), None);

        let long = "a".repeat(MAX_LEARNER_ID_LEN + 1);
        headers.insert(LEARNER_HEADER, HeaderValue::from_str(&long).unwrap());
        assert_eq!(extract_learner_id(&headers), None);
    }
}
