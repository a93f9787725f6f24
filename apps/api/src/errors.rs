use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::recommendation::error::RecommendationError;
use crate::recommendation::models::AttemptOutcome;

/// The only message a client sees when no provider could answer.
pub const TRY_AGAIN_MESSAGE: &str = "No candidates could be found right now. Please try again.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Recommendations unavailable: {0}")]
    RecommendationUnavailable(String),
}

impl From<RecommendationError> for AppError {
    fn from(err: RecommendationError) -> Self {
        let RecommendationError::AllProvidersExhausted { attempts } = &err;
        for attempt in attempts {
            if let AttemptOutcome::SoftFailed { reason } = &attempt.outcome {
                tracing::warn!("{} failed: {reason}", attempt.provider);
            }
        }
        AppError::RecommendationUnavailable(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::RecommendationUnavailable(detail) => {
                tracing::error!("Recommendation failed: {detail}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "RECOMMENDATION_UNAVAILABLE",
                    TRY_AGAIN_MESSAGE.to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
