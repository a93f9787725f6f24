//! LLM Client: the single point of entry for all provider calls.
//!
//! ARCHITECTURAL RULE: No other module may call a vendor API directly.
//! Every provider is one row in the capability table (`ProviderSpec`) plus
//! one adapter implementing `Provider`.
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod anthropic;
pub mod gemini;
pub mod openai;
pub mod prompts;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("provider cannot serve this request shape: {0}")]
    CapabilityMismatch(String),

    #[error("LLM returned empty content")]
    EmptyContent,
}

// ────────────────────────────────────────────────────────────────────────────
// Capability table
// ────────────────────────────────────────────────────────────────────────────

/// Static capability descriptor for one provider. Immutable after startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    /// Lower value is tried first.
    pub priority: u32,
    pub supports_grounded_search: bool,
    pub supports_strict_structured_output: bool,
    pub is_enabled: bool,
}

impl ProviderSpec {
    pub fn new(name: &str, priority: u32, grounded_search: bool, strict_json: bool) -> Self {
        Self {
            name: name.to_string(),
            priority,
            supports_grounded_search: grounded_search,
            supports_strict_structured_output: strict_json,
            is_enabled: true,
        }
    }

    /// Checks that a payload only asks for features this provider declares.
    pub fn accepts(&self, payload: &PromptPayload) -> Result<(), ProviderError> {
        if payload.grounded_search && !self.supports_grounded_search {
            return Err(ProviderError::CapabilityMismatch(format!(
                "{} does not support grounded search",
                self.name
            )));
        }
        if payload.strict_json && !self.supports_strict_structured_output {
            return Err(ProviderError::CapabilityMismatch(format!(
                "{} does not support strict structured output",
                self.name
            )));
        }
        Ok(())
    }
}

pub const GEMINI_SEARCH: &str = "gemini-search";
pub const GEMINI: &str = "gemini";
pub const OPENAI: &str = "openai";
pub const ANTHROPIC: &str = "anthropic";

/// The default provider table, in fallback order.
///
/// Gemini's search tool cannot be combined with JSON mode, so grounded and
/// strict Gemini calls are separate rows.
pub fn default_provider_table() -> Vec<ProviderSpec> {
    vec![
        ProviderSpec::new(GEMINI_SEARCH, 1, true, false),
        ProviderSpec::new(GEMINI, 2, false, true),
        ProviderSpec::new(OPENAI, 3, false, true),
        ProviderSpec::new(ANTHROPIC, 4, false, false),
    ]
}

// ────────────────────────────────────────────────────────────────────────────
// Request / response envelopes
// ────────────────────────────────────────────────────────────────────────────

/// A rendered, provider-agnostic request plus the shape it asks the provider for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPayload {
    pub system: String,
    pub prompt: String,
    pub grounded_search: bool,
    pub strict_json: bool,
}

/// Untyped output of a single provider call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProviderResponse {
    pub provider: String,
    pub text: String,
    pub grounded: bool,
    /// True only when the vendor enforced a JSON response format.
    pub structured_output: bool,
    /// Sources the vendor attached outside the response body.
    pub citations: Vec<String>,
}

/// One adapter per vendor. Adapters never retry; fallback is the orchestrator's job.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn call(&self, payload: &PromptPayload) -> Result<RawProviderResponse, ProviderError>;
}

/// A capability row bound to the adapter that serves it.
#[derive(Clone)]
pub struct RegisteredProvider {
    pub spec: ProviderSpec,
    pub adapter: Arc<dyn Provider>,
}

impl std::fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Vendor 400s that reject a parameter mean the request shape is unsupported.
pub(crate) fn classify_rejection(status: u16, message: String) -> ProviderError {
    let lowered = message.to_lowercase();
    let rejects_feature = status == 400
        && (["not supported", "unsupported", "response_mime_type", "response_format"]
            .iter()
            .any(|marker| lowered.contains(marker))
            || (lowered.contains("tool") && lowered.contains("mime type")));

    if rejects_feature {
        ProviderError::CapabilityMismatch(message)
    } else {
        ProviderError::Api { status, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(grounded_search: bool, strict_json: bool) -> PromptPayload {
        PromptPayload {
            system: String::new(),
            prompt: "find people".to_string(),
            grounded_search,
            strict_json,
        }
    }

    #[test]
    fn test_default_table_priorities_are_distinct_and_ordered() {
        let table = default_provider_table();
        let priorities: Vec<u32> = table.iter().map(|s| s.priority).collect();
        assert_eq!(priorities, vec![1, 2, 3, 4]);
        assert!(table.iter().all(|s| s.is_enabled));
    }

    #[test]
    fn test_grounded_gemini_row_is_not_strict() {
        let table = default_provider_table();
        let row = table.iter().find(|s| s.name == GEMINI_SEARCH).unwrap();
        assert!(row.supports_grounded_search);
        assert!(!row.supports_strict_structured_output);
    }

    #[test]
    fn test_accepts_rejects_unsupported_search() {
        let spec = ProviderSpec::new(OPENAI, 3, false, true);
        let err = spec.accepts(&payload(true, false)).unwrap_err();
        assert!(matches!(err, ProviderError::CapabilityMismatch(_)));
    }

    #[test]
    fn test_accepts_rejects_unsupported_strict_json() {
        let spec = ProviderSpec::new(ANTHROPIC, 4, false, false);
        assert!(spec.accepts(&payload(false, true)).is_err());
        assert!(spec.accepts(&payload(false, false)).is_ok());
    }

    #[test]
    fn test_classify_rejection_detects_capability_mismatch() {
        let err = classify_rejection(
            400,
            "Tool use with a response mime type: 'application/json' is unsupported".to_string(),
        );
        assert!(matches!(err, ProviderError::CapabilityMismatch(_)));

        let err = classify_rejection(401, "invalid api key".to_string());
        assert!(matches!(err, ProviderError::Api { status: 401, .. }));
    }

    #[test]
    fn test_classify_rejection_keeps_unrelated_tool_errors_as_api() {
        let err = classify_rejection(400, "Invalid value for 'tool_choice': expected an object".to_string());
        assert!(matches!(err, ProviderError::Api { status: 400, .. }));

        let err = classify_rejection(
            400,
            "Function calling tool with a response mime type is invalid".to_string(),
        );
        assert!(matches!(err, ProviderError::CapabilityMismatch(_)));
    }
}
