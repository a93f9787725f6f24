//! Axum route handlers for the Recommendation API.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::recommendation::models::{RecommendationResult, RequestContext};
use crate::state::AppState;

/// POST /api/v1/recommendations
///
/// A client disconnect drops this future, which cancels the in-flight
/// provider call and discards any partial list.
pub async fn handle_find_candidates(
    State(state): State<AppState>,
    Json(req): Json<RequestContext>,
) -> Result<Json<RecommendationResult>, AppError> {
    if req.purpose.is_blank() {
        return Err(AppError::Validation("purpose must not be empty".to_string()));
    }
    if req.field.trim().is_empty() {
        return Err(AppError::Validation("field must not be empty".to_string()));
    }

    let result = state.recommender.find_candidates(&req).await?;
    Ok(Json(result))
}
