pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::recommendation::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendation API
        .route(
            "/api/v1/recommendations",
            post(handlers::handle_find_candidates),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;
    use crate::errors::TRY_AGAIN_MESSAGE;
    use crate::llm_client::{
        PromptPayload, Provider, ProviderError, ProviderSpec, RawProviderResponse,
        RegisteredProvider,
    };
    use crate::recommendation::contact_link::ContactLinkResolver;
    use crate::recommendation::orchestrator::{PipelineConfig, Recommender};

    struct Canned(Option<String>);

    #[async_trait]
    impl Provider for Canned {
        async fn call(&self, _payload: &PromptPayload) -> Result<RawProviderResponse, ProviderError> {
            match &self.0 {
                Some(text) => Ok(RawProviderResponse {
                    provider: "canned".to_string(),
                    text: text.clone(),
                    ..Default::default()
                }),
                None => Err(ProviderError::EmptyContent),
            }
        }
    }

    fn app(reply: Option<&str>) -> Router {
        let provider = RegisteredProvider {
            spec: ProviderSpec::new("canned", 1, false, false),
            adapter: Arc::new(Canned(reply.map(str::to_string))),
        };
        let state = AppState {
            config: Config::from_lookup(|_| None).unwrap(),
            recommender: Arc::new(Recommender::new(
                vec![provider],
                PipelineConfig::default(),
                ContactLinkResolver::default(),
            )),
        };
        build_router(state)
    }

    fn post(body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/recommendations")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_lists_providers() {
        let response = app(None)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "outreach-api");
        assert_eq!(body["providers"], json!(["canned"]));
    }

    #[tokio::test]
    async fn test_blank_field_is_rejected() {
        let response = app(None)
            .oneshot(post(json!({ "purpose": "networking", "field": "  " })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_blank_purpose_is_rejected() {
        let response = app(None)
            .oneshot(post(json!({ "purpose": "", "field": "robotics" })))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_exhausted_providers_surface_as_try_again() {
        let response = app(None)
            .oneshot(post(json!({ "purpose": "academic", "field": "robotics" })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "RECOMMENDATION_UNAVAILABLE");
        assert_eq!(body["error"]["message"], TRY_AGAIN_MESSAGE);
    }

    #[tokio::test]
    async fn test_successful_recommendation() {
        let reply = r#"```json
{"candidates": [{"name": "Ana Li", "position": "Professor at MIT", "match_score": 88,
  "match_reason": "Runs the soft robotics lab the sender wants to join",
  "evidence": ["Lab page lists open PhD positions"], "sources": ["https://lab.example.edu"]}]}
```"#;
        let response = app(Some(reply))
            .oneshot(post(json!({
                "purpose": "academic",
                "field": "soft robotics",
                "sender_summary": { "skills": ["ROS", "CAD"] }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["provider"], "canned");
        assert_eq!(body["degraded"], false);
        let candidate = &body["candidates"][0];
        assert_eq!(candidate["name"], "Ana Li");
        assert_eq!(candidate["uncertainty"], "none");
        assert_eq!(candidate["contact_link"]["kind"], "search");
        assert!(candidate.get("proposed_profile_url").is_none());
        assert_eq!(body["attempts"][0]["state"], "succeeded");
    }
}
