use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::adaptive::AdaptiveError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Json<SuccessResponse<T>> {
    Json(SuccessResponse {
        success: true,
        data,
    })
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    is_operational: bool,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            is_operational: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    fn operational(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            is_operational: true,
        }
    }
}

impl From<AdaptiveError> for AppError {
    fn from(err: AdaptiveError) -> Self {
        let message = err.to_string();
        match err {
            AdaptiveError::InvalidEvent(_) => {
                Self::operational(StatusCode::BAD_REQUEST, "INVALID_EVENT", message)
            }
            AdaptiveError::EmptyCatalog => {
                Self::operational(StatusCode::NOT_FOUND, "EMPTY_CATALOG", message)
            }
            AdaptiveError::Timeout { .. } => {
                Self::operational(StatusCode::GATEWAY_TIMEOUT, "TIMEOUT", message)
            }
            AdaptiveError::UnknownRecommendation(_) => Self::not_found(message),
            AdaptiveError::Configuration(_) => {
                tracing::error!(error = %message, "configuration error while serving request");
                Self::internal(message)
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            self.message
        } else {
            "internal server error".to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

pub fn json_error(
    status: StatusCode,
    code: impl Into<String>,
    message: impl Into<String>,
) -> AppError {
    AppError::operational(status, code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adaptive_errors_map_to_status_codes() {
        let cases = [
            (AdaptiveError::invalid_event("bad"), StatusCode::BAD_REQUEST, "INVALID_EVENT"),
            (AdaptiveError::EmptyCatalog, StatusCode::NOT_FOUND, "EMPTY_CATALOG"),
            (
                AdaptiveError::Timeout {
                    operation: "catalog fetch",
                    budget_ms: 10,
                },
                StatusCode::GATEWAY_TIMEOUT,
                "TIMEOUT",
            ),
            (
                AdaptiveError::config("broken"),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status(), status);
            assert_eq!(app.code(), code);
        }
    }
}
