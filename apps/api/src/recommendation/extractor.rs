//! Response Extractor: recovers a JSON value from free-form provider text.
//!
//! Tolerance rules, in order:
//! 1. If the vendor enforced JSON output, parse the body as-is.
//! 2. Drop markdown fence lines (```` ``` ```` / ```` ```json ````).
//! 3. Take the span from the first `{` to the last `}` (or `[`..`]` when the
//!    payload is a bare array), ignoring prose before and after.
//! 4. If that span does not parse, run one repair pass: cut back to the last
//!    complete element and close whatever containers are still open.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::llm_client::RawProviderResponse;
use crate::recommendation::error::ExtractionError;

static FENCE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*```[A-Za-z0-9_-]*[ \t]*\r?$").expect("valid regex"));

/// Cut points tried during repair, newest first.
const MAX_REPAIR_CANDIDATES: usize = 64;

pub fn extract(raw: &RawProviderResponse) -> Result<Value, ExtractionError> {
    if raw.structured_output {
        match serde_json::from_str::<Value>(raw.text.trim()) {
            Ok(value) => return Ok(value),
            Err(e) => debug!(
                "{} claimed structured output but body did not parse ({e}); scanning text",
                raw.provider
            ),
        }
    }
    extract_from_text(&raw.text)
}

pub fn extract_from_text(text: &str) -> Result<Value, ExtractionError> {
    let unfenced = FENCE_LINE.replace_all(text, "");
    let span = json_span(&unfenced).ok_or(ExtractionError::NoJson)?;

    match serde_json::from_str::<Value>(span) {
        Ok(value) => Ok(value),
        Err(first_error) => {
            debug!("direct parse failed ({first_error}); attempting truncation repair");
            repair(span).ok_or_else(|| ExtractionError::Unparseable(first_error.to_string()))
        }
    }
}

/// First `{` to the last `}`. A `[` only wins when no `{` exists or when it
/// directly opens the first object (a bare array of entries), so prose like
/// "[1]" ahead of the payload is skipped. When the text has an opener but no
/// closer (truncated output), runs to the end.
fn json_span(text: &str) -> Option<&str> {
    let object_start = text.find('{');
    let array_start = text.find('[');

    let (start, close) = match (object_start, array_start) {
        (Some(o), Some(a)) if a < o && text[a + 1..o].trim().is_empty() => (a, ']'),
        (Some(o), _) => (o, '}'),
        (None, Some(a)) => (a, ']'),
        (None, None) => return None,
    };

    match text.rfind(close) {
        Some(end) if end > start => Some(&text[start..=end]),
        _ => Some(&text[start..]),
    }
}

/// Byte offset just after a closed container, plus the containers still open there.
struct CutPoint {
    end: usize,
    open: Vec<char>,
}

fn repair(span: &str) -> Option<Value> {
    let mut cuts = Vec::new();
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in span.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => stack.push(ch),
            '}' | ']' => {
                stack.pop();
                cuts.push(CutPoint {
                    end: i + ch.len_utf8(),
                    open: stack.clone(),
                });
                if stack.is_empty() {
                    // A complete top-level value; anything after it is noise.
                    break;
                }
            }
            _ => {}
        }
    }

    cuts.iter()
        .rev()
        .take(MAX_REPAIR_CANDIDATES)
        .find_map(|cut| {
            let mut candidate = span[..cut.end].to_string();
            for open in cut.open.iter().rev() {
                candidate.push(if *open == '{' { '}' } else { ']' });
            }
            serde_json::from_str::<Value>(&candidate).ok()
        })
}
