use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdaptiveError {
    #[error("invalid emotion event: {0}")]
    InvalidEvent(String),
    #[error("no eligible content in catalog")]
    EmptyCatalog,
    #[error("{operation} exceeded time budget of {budget_ms}ms")]
    Timeout { operation: &'static str, budget_ms: u64 },
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("unknown recommendation: {0}")]
    UnknownRecommendation(String),
}

impl AdaptiveError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn invalid_event(message: impl Into<String>) -> Self {
        Self::InvalidEvent(message.into())
    }

    /// Whether a caller may retry the same request with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type AdaptiveResult<T> = Result<T, AdaptiveError>;
