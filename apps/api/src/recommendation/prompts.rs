// All LLM prompt constants for the Recommendation module.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Recommendation request template.
/// Replace: {max_candidates}, {purpose}, {field}, {sender_block}, {preferences_block},
///          {fabrication_instruction}, {schema_directive}, {link_instruction}, {format_instruction}
pub const RECOMMENDATION_PROMPT_TEMPLATE: &str = r#"Find up to {max_candidates} real people who would be good outreach targets for the sender below.

OUTREACH PURPOSE: {purpose}
FIELD: {field}

SENDER PROFILE:
{sender_block}

TARGETING PREFERENCES:
{preferences_block}

{fabrication_instruction}

{schema_directive}

{link_instruction}

{format_instruction}"#;

/// Output schema directive. Field names here are what the normalizer reads first.
pub const SCHEMA_DIRECTIVE: &str = r#"Return a JSON object with this EXACT schema:
{
  "candidates": [
    {
      "name": "Full name",
      "position": "Current title at Organization",
      "match_score": 85,
      "match_reason": "Why this person fits the sender's purpose, not a restatement of their title",
      "evidence": ["Short factual snippet from a source"],
      "sources": ["https://source-url"],
      "uncertainty": "none | low | high",
      "profile_url": ""
    }
  ]
}

Rules:
- match_score is a number from 0 to 100
- evidence and sources may be empty lists, never invented
- uncertainty is "high" when you have no source for a specific claim"#;

/// Appended when the provider cannot enforce a JSON response format.
pub const FENCED_FORMAT_INSTRUCTION: &str =
    "Wrap the JSON object in a single ```json code fence. Do not put anything else inside the fence.";

/// Appended when the provider enforces a JSON response format.
pub const STRICT_FORMAT_INSTRUCTION: &str = "Return ONLY the JSON object, no additional text.";

/// Appended when the provider will run a live web search.
pub const GROUNDED_SEARCH_INSTRUCTION: &str =
    "Use web search to confirm each person's CURRENT position and cite the pages you used in `sources`.";

/// Rendered in place of any empty section.
pub const NOT_SPECIFIED: &str = "Not specified";
