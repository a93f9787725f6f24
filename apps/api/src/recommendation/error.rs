//! Error taxonomy for the recommendation pipeline.
//!
//! Only `RecommendationError` escapes the orchestrator. Everything else is a
//! component-local result that the orchestrator turns into a fallback step.

use thiserror::Error;

use crate::llm_client::ProviderError;
use crate::recommendation::models::ProviderAttempt;

/// No JSON-shaped content could be recovered from a provider response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("response contains no JSON object or array")]
    NoJson,

    #[error("JSON could not be parsed even after repair: {0}")]
    Unparseable(String),
}

/// Why a single provider entry was omitted. Logged, never escalated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationDrop {
    #[error("entry {index} is not an object")]
    NotAnObject { index: usize },

    #[error("entry {index} has no name")]
    MissingName { index: usize },

    #[error("entry {index} ({name}) has no match reason")]
    MissingReason { index: usize, name: String },

    #[error("entry {index} ({name}) only restates the position as its reason")]
    ReasonRestatesPosition { index: usize, name: String },

    #[error("entry {index} ({name}) duplicates a higher-scoring entry")]
    Duplicate { index: usize, name: String },
}

/// A provider outcome that advances the orchestrator to the next provider.
#[derive(Debug, Error)]
pub enum SoftFailure {
    #[error("capability mismatch: {0}")]
    CapabilityMismatch(String),

    #[error("provider call failed: {0}")]
    Provider(ProviderError),

    #[error("provider call timed out after {ms}ms")]
    Timeout { ms: u64 },

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("response held no valid candidates")]
    EmptyResult,
}

impl From<ProviderError> for SoftFailure {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::CapabilityMismatch(msg) => SoftFailure::CapabilityMismatch(msg),
            other => SoftFailure::Provider(other),
        }
    }
}

/// Terminal failure of a recommendation call.
#[derive(Debug, Error)]
pub enum RecommendationError {
    #[error("all {} providers exhausted without a usable result", attempts.len())]
    AllProvidersExhausted { attempts: Vec<ProviderAttempt> },
}
