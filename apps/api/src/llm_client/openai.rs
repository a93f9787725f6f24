//! OpenAI chat completions adapter. Strict JSON via `response_format`, no grounding.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{
    classify_rejection, PromptPayload, Provider, ProviderError, RawProviderResponse, OPENAI,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    fn request_body(&self, payload: &PromptPayload) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": payload.system},
                {"role": "user", "content": payload.prompt},
            ],
        });
        if payload.strict_json {
            body["response_format"] = json!({"type": "json_object"});
        }
        body
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    async fn call(&self, payload: &PromptPayload) -> Result<RawProviderResponse, ProviderError> {
        if payload.grounded_search {
            return Err(ProviderError::CapabilityMismatch(
                "openai chat completions has no search grounding".to_string(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&self.request_body(payload))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<OpenAiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(classify_rejection(status.as_u16(), message));
        }

        let body: ChatResponse = response.json().await?;
        if let Some(usage) = &body.usage {
            debug!(
                "openai call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let text = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(ProviderError::EmptyContent);
        }

        Ok(RawProviderResponse {
            provider: OPENAI.to_string(),
            text,
            grounded: false,
            structured_output: payload.strict_json,
            citations: vec![],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn strict_payload() -> PromptPayload {
        PromptPayload {
            system: "system".to_string(),
            prompt: "find people".to_string(),
            grounded_search: false,
            strict_json: true,
        }
    }

    fn provider_for(server: &MockServer) -> OpenAiProvider {
        OpenAiProvider::new(
            &server.uri(),
            "sk-test".to_string(),
            DEFAULT_MODEL.to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_strict_call_sends_json_response_format() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({"response_format": {"type": "json_object"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "{\"candidates\": []}"}}],
                "usage": {"prompt_tokens": 20, "completion_tokens": 4}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let raw = provider_for(&server).call(&strict_payload()).await.unwrap();
        assert_eq!(raw.provider, OPENAI);
        assert_eq!(raw.text, "{\"candidates\": []}");
        assert!(raw.structured_output);
    }

    #[tokio::test]
    async fn test_null_content_is_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let err = provider_for(&server).call(&strict_payload()).await.unwrap_err();
        assert!(matches!(err, ProviderError::EmptyContent));
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream overloaded"))
            .mount(&server)
            .await;

        let err = provider_for(&server).call(&strict_payload()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Api { status: 503, .. }));
    }
}
