// Shared prompt fragments used by every provider request.
// Recommendation-specific templates live in recommendation/prompts.rs.

/// System prompt for providers that enforce a JSON response format.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured research assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT include explanations or apologies.";

/// System prompt for providers without structured-output enforcement.
/// The JSON must arrive inside a ```json fence so it can be located in free text.
pub const FENCED_JSON_SYSTEM: &str = "You are a precise, structured research assistant. \
    Put your entire answer in ONE JSON object inside a single ```json code fence. \
    Keep any commentary outside the fence to a minimum.";

/// Anti-fabrication rule appended to every recommendation request.
pub const NO_FABRICATION_INSTRUCTION: &str = "\
    CRITICAL: Only recommend real people whose current position you can support with a source. \
    Do NOT invent names, positions, quotes or facts. \
    Every evidence snippet must be a short factual statement taken from a source you list.";

/// Anti-hallucination rule for contact links.
pub const NO_GUESSED_LINKS_INSTRUCTION: &str = "\
    CRITICAL: Leave `profile_url` as an empty string unless you saw the exact profile URL in a source. \
    NEVER construct a profile URL from the person's name. An empty link is always better than a guessed one.";
