//! Gemini `generateContent` adapter.
//!
//! Serves two table rows: grounded (Google Search tool, free-text output) and
//! strict (JSON response MIME type). The API rejects the search tool combined
//! with JSON mode, so a payload asking for both is refused before any call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{classify_rejection, PromptPayload, Provider, ProviderError, RawProviderResponse};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct GeminiProvider {
    /// Table row name this adapter reports as the producing provider.
    name: String,
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(
        name: &str,
        base_url: &str,
        api_key: String,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ProviderError> {
        Ok(Self {
            name: name.to_string(),
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
        })
    }

    fn request_body(payload: &PromptPayload) -> Value {
        let mut body = json!({
            "systemInstruction": {"parts": [{"text": payload.system}]},
            "contents": [{"role": "user", "parts": [{"text": payload.prompt}]}],
        });
        if payload.grounded_search {
            body["tools"] = json!([{"google_search": {}}]);
        }
        if payload.strict_json {
            body["generationConfig"] = json!({"responseMimeType": "application/json"});
        }
        body
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    async fn call(&self, payload: &PromptPayload) -> Result<RawProviderResponse, ProviderError> {
        if payload.grounded_search && payload.strict_json {
            return Err(ProviderError::CapabilityMismatch(
                "gemini cannot combine the search tool with JSON mode".to_string(),
            ));
        }

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(payload))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GeminiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(classify_rejection(status.as_u16(), message));
        }

        let body: GenerateResponse = response.json().await?;
        if let Some(usage) = &body.usage_metadata {
            debug!(
                "{} call succeeded: prompt_tokens={}, output_tokens={}",
                self.name, usage.prompt_token_count, usage.candidates_token_count
            );
        }

        let first = body.candidates.into_iter().next();
        let text = first
            .as_ref()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyContent);
        }

        let citations = first
            .and_then(|c| c.grounding_metadata)
            .map(|meta| {
                meta.grounding_chunks
                    .into_iter()
                    .filter_map(|chunk| chunk.web.and_then(|w| w.uri))
                    .collect()
            })
            .unwrap_or_default();

        Ok(RawProviderResponse {
            provider: self.name.clone(),
            text,
            grounded: payload.grounded_search,
            structured_output: payload.strict_json,
            citations,
        })
    }
}
