//! Request and result types for candidate recommendation.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Input
// ────────────────────────────────────────────────────────────────────────────

/// Why the sender is reaching out. Unknown values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Purpose {
    Academic,
    JobSeeking,
    Networking,
    Mentorship,
    Collaboration,
    Other(String),
}

impl From<String> for Purpose {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "academic" | "research" => Purpose::Academic,
            "job_seeking" | "job" | "job_search" => Purpose::JobSeeking,
            "networking" => Purpose::Networking,
            "mentorship" | "mentoring" => Purpose::Mentorship,
            "collaboration" => Purpose::Collaboration,
            _ => Purpose::Other(value.trim().to_string()),
        }
    }
}

impl From<Purpose> for String {
    fn from(value: Purpose) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Purpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Purpose::Academic => write!(f, "academic"),
            Purpose::JobSeeking => write!(f, "job_seeking"),
            Purpose::Networking => write!(f, "networking"),
            Purpose::Mentorship => write!(f, "mentorship"),
            Purpose::Collaboration => write!(f, "collaboration"),
            Purpose::Other(text) => write!(f, "{text}"),
        }
    }
}

impl Purpose {
    pub fn is_blank(&self) -> bool {
        matches!(self, Purpose::Other(text) if text.trim().is_empty())
    }
}

/// Bullet-style summary of the sender, produced by the intake layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SenderSummary {
    #[serde(default)]
    pub education: Vec<String>,
    #[serde(default)]
    pub experience: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub free_text: Option<String>,
}

/// How to trade reply likelihood against the target's seniority/prestige.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyPrestigeBalance {
    FavorReplyLikelihood,
    Balanced,
    FavorPrestige,
}

/// Free-form targeting preferences. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetingPreferences {
    #[serde(default)]
    pub search_intent: Option<String>,
    #[serde(default)]
    pub target_type: Option<String>,
    #[serde(default)]
    pub must_have_keywords: Vec<String>,
    #[serde(default)]
    pub must_not_keywords: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub seniority: Option<String>,
    #[serde(default)]
    pub reply_vs_prestige: Option<ReplyPrestigeBalance>,
    #[serde(default)]
    pub example_candidates: Vec<String>,
    #[serde(default)]
    pub evidence_links: Vec<String>,
}

/// Everything one recommendation call needs. Created per call, never shared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub purpose: Purpose,
    pub field: String,
    #[serde(default)]
    pub sender_summary: SenderSummary,
    #[serde(default)]
    pub preferences: TargetingPreferences,
}

// ────────────────────────────────────────────────────────────────────────────
// Candidate
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Uncertainty {
    None,
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// A validated profile page.
    Profile,
    /// A search entry point the user verifies themselves.
    Search,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactLink {
    pub url: String,
    pub kind: LinkKind,
}

/// One recommended contact in canonical form.
///
/// Built only by the normalizer, which always seeds `contact_link` with a
/// search link; the resolver may upgrade it to a validated profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub position: String,
    /// Clamped to 0–100.
    pub match_score: f64,
    pub match_reason: String,
    pub evidence: Vec<String>,
    pub sources: Vec<String>,
    pub uncertainty: Uncertainty,
    pub contact_link: ContactLink,
    /// Provider's own free-text caveat, if it gave one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caveat: Option<String>,
    /// Profile URL as proposed by the provider. Consumed by the resolver, never emitted.
    #[serde(skip)]
    pub proposed_profile_url: Option<String>,
    /// Position in the provider's original output, used for tie-breaks.
    #[serde(skip)]
    pub provider_rank: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

/// What happened to one provider during a recommendation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded { candidates: usize },
    SoftFailed { reason: String },
    NotTried,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderAttempt {
    pub provider: String,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

/// Final, read-only answer to a recommendation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub request_id: Uuid,
    /// Descending `match_score`, ties in provider order.
    pub candidates: Vec<Candidate>,
    pub provider: String,
    /// True when at least one provider failed before `provider` succeeded.
    pub degraded: bool,
    pub attempts: Vec<ProviderAttempt>,
    pub generated_at: DateTime<Utc>,
}
