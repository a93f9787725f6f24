//! Prompt Builder: renders a `RequestContext` into a provider request.
//!
//! Pure and deterministic: the same context and provider always render the
//! same payload. Blank or whitespace-only fields are skipped, never rejected.

use crate::llm_client::prompts::{
    FENCED_JSON_SYSTEM, JSON_ONLY_SYSTEM, NO_FABRICATION_INSTRUCTION, NO_GUESSED_LINKS_INSTRUCTION,
};
use crate::llm_client::{PromptPayload, ProviderSpec};
use crate::recommendation::models::{ReplyPrestigeBalance, RequestContext};
use crate::recommendation::prompts::{
    FENCED_FORMAT_INSTRUCTION, GROUNDED_SEARCH_INSTRUCTION, NOT_SPECIFIED,
    RECOMMENDATION_PROMPT_TEMPLATE, SCHEMA_DIRECTIVE, STRICT_FORMAT_INSTRUCTION,
};

#[derive(Debug, Clone, Copy)]
pub struct PromptBuilder {
    max_candidates: usize,
}

impl PromptBuilder {
    pub fn new(max_candidates: usize) -> Self {
        Self {
            max_candidates: max_candidates.max(1),
        }
    }

    /// Renders the request for one provider. The payload's shape mirrors the
    /// provider's declared capabilities, so it never asks for more than the
    /// provider supports.
    pub fn build(&self, context: &RequestContext, provider: &ProviderSpec) -> PromptPayload {
        let grounded_search = provider.supports_grounded_search;
        let strict_json = provider.supports_strict_structured_output;

        let format_instruction = match (strict_json, grounded_search) {
            (true, _) => STRICT_FORMAT_INSTRUCTION.to_string(),
            (false, true) => format!("{GROUNDED_SEARCH_INSTRUCTION}\n{FENCED_FORMAT_INSTRUCTION}"),
            (false, false) => FENCED_FORMAT_INSTRUCTION.to_string(),
        };

        let prompt = RECOMMENDATION_PROMPT_TEMPLATE
            .replace("{max_candidates}", &self.max_candidates.to_string())
            .replace("{purpose}", or_not_specified(&context.purpose.to_string()))
            .replace("{field}", or_not_specified(&context.field))
            .replace("{sender_block}", &render_sender(context))
            .replace("{preferences_block}", &render_preferences(context))
            .replace("{fabrication_instruction}", NO_FABRICATION_INSTRUCTION)
            .replace("{schema_directive}", SCHEMA_DIRECTIVE)
            .replace("{link_instruction}", NO_GUESSED_LINKS_INSTRUCTION)
            .replace("{format_instruction}", &format_instruction);

        let system = if strict_json {
            JSON_ONLY_SYSTEM
        } else {
            FENCED_JSON_SYSTEM
        };

        PromptPayload {
            system: system.to_string(),
            prompt,
            grounded_search,
            strict_json,
        }
    }
}

fn or_not_specified(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_SPECIFIED
    } else {
        trimmed
    }
}

/// Trims, drops blanks, joins with "; ".
fn join_present(items: &[String]) -> Option<String> {
    let present: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    (!present.is_empty()).then(|| present.join("; "))
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn render_sender(context: &RequestContext) -> String {
    let s = &context.sender_summary;
    let mut lines = Vec::new();

    for (label, items) in [
        ("Education", &s.education),
        ("Experience", &s.experience),
        ("Skills", &s.skills),
        ("Projects", &s.projects),
    ] {
        if let Some(joined) = join_present(items) {
            lines.push(format!("- {label}: {joined}"));
        }
    }
    if let Some(text) = present(&s.free_text) {
        lines.push(format!("- Additional context: {text}"));
    }

    if lines.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        lines.join("\n")
    }
}

fn render_preferences(context: &RequestContext) -> String {
    let p = &context.preferences;
    let mut lines = Vec::new();

    for (label, value) in [
        ("Search intent", present(&p.search_intent)),
        ("Target type", present(&p.target_type)),
        ("Location", present(&p.location)),
        ("Industry", present(&p.industry)),
        ("Seniority", present(&p.seniority)),
    ] {
        if let Some(v) = value {
            lines.push(format!("- {label}: {v}"));
        }
    }

    if let Some(joined) = join_present(&p.must_have_keywords) {
        lines.push(format!("- Must mention: {joined}"));
    }
    if let Some(joined) = join_present(&p.must_not_keywords) {
        lines.push(format!("- Must NOT match: {joined}"));
    }
    if let Some(balance) = p.reply_vs_prestige {
        let text = match balance {
            ReplyPrestigeBalance::FavorReplyLikelihood => {
                "prefer people likely to reply to cold outreach over famous names"
            }
            ReplyPrestigeBalance::Balanced => "balance reply likelihood and prestige",
            ReplyPrestigeBalance::FavorPrestige => {
                "prefer senior, well-known people even if replies are less likely"
            }
        };
        lines.push(format!("- Reply likelihood vs prestige: {text}"));
    }
    if let Some(joined) = join_present(&p.example_candidates) {
        lines.push(format!("- Example people the sender has in mind: {joined}"));
    }
    if let Some(joined) = join_present(&p.evidence_links) {
        lines.push(format!("- Reference links from the sender: {joined}"));
    }

    if lines.is_empty() {
        NOT_SPECIFIED.to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::{default_provider_table, ProviderSpec, ANTHROPIC, GEMINI_SEARCH, OPENAI};
    use crate::recommendation::models::{Purpose, SenderSummary, TargetingPreferences};

    fn context() -> RequestContext {
        RequestContext {
            purpose: Purpose::JobSeeking,
            field: "fintech payments".to_string(),
            sender_summary: SenderSummary {
                education: vec!["BSc Computer Science, State University".to_string()],
                experience: vec!["2 years backend engineer".to_string(), "  ".to_string()],
                skills: vec!["Rust".to_string(), "Kafka".to_string()],
                projects: vec![],
                free_text: Some("   ".to_string()),
            },
            preferences: TargetingPreferences {
                location: Some("New York".to_string()),
                must_have_keywords: vec!["payments".to_string()],
                reply_vs_prestige: Some(ReplyPrestigeBalance::FavorReplyLikelihood),
                ..Default::default()
            },
        }
    }

    fn spec(name: &str) -> ProviderSpec {
        default_provider_table()
            .into_iter()
            .find(|s| s.name == name)
            .unwrap()
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::new(5);
        let a = builder.build(&context(), &spec(OPENAI));
        let b = builder.build(&context(), &spec(OPENAI));
        assert_eq!(a, b);
    }

    #[test]
    fn test_prompt_embeds_context_and_skips_blanks() {
        let payload = PromptBuilder::new(5).build(&context(), &spec(OPENAI));
        assert!(payload.prompt.contains("Find up to 5 real people"));
        assert!(payload.prompt.contains("OUTREACH PURPOSE: job_seeking"));
        assert!(payload.prompt.contains("FIELD: fintech payments"));
        assert!(payload.prompt.contains("- Skills: Rust; Kafka"));
        assert!(payload.prompt.contains("- Experience: 2 years backend engineer\n"));
        assert!(payload.prompt.contains("- Location: New York"));
        assert!(payload.prompt.contains("- Must mention: payments"));
        assert!(payload.prompt.contains("likely to reply"));
        assert!(!payload.prompt.contains("Projects"));
        assert!(!payload.prompt.contains("Additional context"));
        assert!(!payload.prompt.contains("Industry"));
    }

    #[test]
    fn test_schema_and_link_directives_always_present() {
        for spec in default_provider_table() {
            let payload = PromptBuilder::new(3).build(&context(), &spec);
            for field in [
                "\"name\"",
                "\"position\"",
                "\"match_score\"",
                "\"match_reason\"",
                "\"evidence\"",
                "\"sources\"",
                "\"uncertainty\"",
            ] {
                assert!(payload.prompt.contains(field), "{} missing {field}", spec.name);
            }
            assert!(payload.prompt.contains("NEVER construct a profile URL"));
        }
    }

    #[test]
    fn test_non_strict_provider_asks_for_fence() {
        let payload = PromptBuilder::new(5).build(&context(), &spec(ANTHROPIC));
        assert!(!payload.strict_json);
        assert!(payload.prompt.contains("```json code fence"));
        assert_eq!(payload.system, FENCED_JSON_SYSTEM);

        let strict = PromptBuilder::new(5).build(&context(), &spec(OPENAI));
        assert!(strict.strict_json);
        assert!(!strict.prompt.contains("code fence"));
        assert_eq!(strict.system, JSON_ONLY_SYSTEM);
    }

    #[test]
    fn test_payload_shape_matches_provider_capabilities() {
        for spec in default_provider_table() {
            let payload = PromptBuilder::new(5).build(&context(), &spec);
            assert!(spec.accepts(&payload).is_ok(), "{} rejected its own payload", spec.name);
        }
        let grounded = PromptBuilder::new(5).build(&context(), &spec(GEMINI_SEARCH));
        assert!(grounded.grounded_search);
        assert!(grounded.prompt.contains("Use web search"));
    }

    #[test]
    fn test_empty_context_renders_not_specified() {
        let ctx = RequestContext {
            purpose: Purpose::from(String::new()),
            field: "   ".to_string(),
            sender_summary: SenderSummary::default(),
            preferences: TargetingPreferences::default(),
        };
        let payload = PromptBuilder::new(0).build(&ctx, &spec(OPENAI));
        assert!(payload.prompt.contains("Find up to 1 real people"));
        assert!(payload.prompt.contains("OUTREACH PURPOSE: Not specified"));
        assert!(payload.prompt.contains("FIELD: Not specified"));
        assert!(payload.prompt.contains("SENDER PROFILE:\nNot specified"));
    }
}
