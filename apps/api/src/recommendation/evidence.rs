//! Evidence Attacher: merges out-of-band citations and derives uncertainty.
//!
//! Only aggregates what the provider returned. Evidence text is never created here.

use tracing::debug;
use url::Url;

use crate::recommendation::models::{Candidate, Uncertainty};

pub fn attach(mut candidate: Candidate, citations: &[String]) -> Candidate {
    let before = candidate.sources.len();
    for citation in citations {
        let citation = citation.trim();
        if is_web_url(citation) && !candidate.sources.iter().any(|s| s == citation) {
            candidate.sources.push(citation.to_string());
        }
    }
    if candidate.sources.len() > before {
        debug!(
            "attached {} provider citations to {}",
            candidate.sources.len() - before,
            candidate.name
        );
    }

    candidate.uncertainty = uncertainty_for(&candidate.evidence, &candidate.sources);
    candidate
}

/// `none` needs both evidence and a source; one of the two is `low`; neither is `high`.
pub fn uncertainty_for(evidence: &[String], sources: &[String]) -> Uncertainty {
    match (!evidence.is_empty(), !sources.is_empty()) {
        (true, true) => Uncertainty::None,
        (true, false) | (false, true) => Uncertainty::Low,
        (false, false) => Uncertainty::High,
    }
}

fn is_web_url(text: &str) -> bool {
    Url::parse(text)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
