use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version and the providers that will be tried, in order.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    let providers: Vec<&str> = state
        .recommender
        .providers()
        .map(|spec| spec.name.as_str())
        .collect();

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "outreach-api",
        "providers": providers,
        "grounded_only": state.config.require_grounded_search
    }))
}
