//! Candidate Normalizer: maps loosely shaped provider JSON onto `Candidate`.
//!
//! Never fails. Each entry either becomes a `Candidate` or is dropped with a
//! logged `ValidationDrop`; the caller decides what an empty list means.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};
use url::Url;

use crate::recommendation::contact_link::search_link;
use crate::recommendation::error::ValidationDrop;
use crate::recommendation::models::{Candidate, Uncertainty};

/// Keys that may hold the entry list, checked in order.
const LIST_KEYS: &[&str] = &[
    "candidates",
    "recommendations",
    "results",
    "data",
    "items",
    "people",
];

const NAME_KEYS: &[&str] = &["name", "full_name"];
const POSITION_KEYS: &[&str] = &["position", "title", "role"];
const ORGANIZATION_KEYS: &[&str] = &["organization", "company", "affiliation"];
const REASON_KEYS: &[&str] = &["match_reason", "reason", "why"];
const SCORE_KEYS: &[&str] = &["match_score", "score"];
const PROFILE_URL_KEYS: &[&str] = &[
    "profile_url",
    "linkedin",
    "linkedin_url",
    "contact_link",
    "url",
];

pub fn normalize(json: &Value) -> Vec<Candidate> {
    let entries = locate_entries(json);
    let mut candidates = Vec::with_capacity(entries.len());

    for (index, entry) in entries.iter().enumerate() {
        match normalize_entry(index, entry) {
            Ok(candidate) => candidates.push(candidate),
            Err(drop) => warn!("dropping provider entry: {drop}"),
        }
    }

    let kept = dedupe_by_name(candidates);
    debug!("normalized {} of {} provider entries", kept.len(), entries.len());
    kept
}

/// Finds the array of entries wherever the provider put it.
fn locate_entries(json: &Value) -> Vec<Value> {
    match json {
        Value::Array(items) => items.clone(),
        Value::Object(map) => {
            for key in LIST_KEYS {
                if let Some(Value::Array(items)) = map.get(*key) {
                    return items.clone();
                }
            }
            if map.contains_key("name") {
                vec![json.clone()]
            } else {
                vec![]
            }
        }
        _ => vec![],
    }
}

pub fn normalize_entry(index: usize, entry: &Value) -> Result<Candidate, ValidationDrop> {
    let obj = entry
        .as_object()
        .ok_or(ValidationDrop::NotAnObject { index })?;

    let name = first_string(obj, NAME_KEYS)
        .map(collapse_whitespace)
        .filter(|n| !n.is_empty())
        .ok_or(ValidationDrop::MissingName { index })?;

    let position = compose_position(
        first_string(obj, POSITION_KEYS).map(collapse_whitespace),
        first_string(obj, ORGANIZATION_KEYS).map(collapse_whitespace),
    );

    let match_reason = first_string(obj, REASON_KEYS)
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .ok_or_else(|| ValidationDrop::MissingReason {
            index,
            name: name.clone(),
        })?;

    if !position.is_empty() && match_reason.eq_ignore_ascii_case(&position) {
        return Err(ValidationDrop::ReasonRestatesPosition { index, name });
    }

    let match_score = SCORE_KEYS
        .iter()
        .find_map(|k| obj.get(*k))
        .map(coerce_score)
        .unwrap_or(0.0);

    let evidence = string_list(obj.get("evidence"));
    let sources = url_list(obj.get("sources"));
    let caveat = first_string(obj, &["uncertainty"])
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty() && !is_uncertainty_level(u));
    let proposed_profile_url = first_string(obj, PROFILE_URL_KEYS)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());

    let contact_link = search_link(&name, &position);

    Ok(Candidate {
        name,
        position,
        match_score,
        match_reason,
        evidence,
        sources,
        // Derived later from evidence and sources.
        uncertainty: Uncertainty::High,
        contact_link,
        caveat,
        proposed_profile_url,
        provider_rank: index,
    })
}

/// Case/whitespace-insensitive identity of a name.
pub fn name_key(name: &str) -> String {
    collapse_whitespace(name).to_lowercase()
}

/// Keeps the highest-scoring entry per name in the slot of the group's first
/// occurrence. Equal scores keep the earlier entry.
fn dedupe_by_name(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut slots: Vec<Candidate> = Vec::with_capacity(candidates.len());
    let mut by_key: HashMap<String, usize> = HashMap::new();

    for candidate in candidates {
        let key = name_key(&candidate.name);
        match by_key.get(&key).copied() {
            Some(slot) => {
                let (loser_index, loser_name) = if candidate.match_score > slots[slot].match_score
                {
                    let rank = slots[slot].provider_rank;
                    let replaced = std::mem::replace(&mut slots[slot], candidate);
                    slots[slot].provider_rank = rank;
                    (replaced.provider_rank, replaced.name)
                } else {
                    (candidate.provider_rank, candidate.name)
                };
                debug!(
                    "{}",
                    ValidationDrop::Duplicate {
                        index: loser_index,
                        name: loser_name
                    }
                );
            }
            None => {
                by_key.insert(key, slots.len());
                slots.push(candidate);
            }
        }
    }

    slots
}

fn first_string<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// "VP" + "Example Bank" → "VP at Example Bank", unless the title already names it.
fn compose_position(title: Option<String>, organization: Option<String>) -> String {
    let title = title.unwrap_or_default();
    match organization.filter(|o| !o.is_empty()) {
        Some(org) if title.is_empty() => format!("at {org}"),
        Some(org) if !title.to_lowercase().contains(&org.to_lowercase()) => {
            format!("{title} at {org}")
        }
        _ => title,
    }
}

/// Numbers, numeric strings ("85", "85%", "85/100"); anything else is 0.
fn coerce_score(value: &Value) -> f64 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let head = s.trim().trim_end_matches('%');
            let head = head.split('/').next().unwrap_or(head).trim();
            head.parse::<f64>().ok()
        }
        _ => None,
    };
    match raw {
        Some(score) if score.is_finite() => score.clamp(0.0, 100.0),
        _ => 0.0,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        _ => vec![],
    }
}

/// Absolute http(s) URLs only, first occurrence wins.
fn url_list(value: Option<&Value>) -> Vec<String> {
    let mut urls: Vec<String> = Vec::new();
    for item in string_list(value) {
        let is_web = Url::parse(&item)
            .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .unwrap_or(false);
        if is_web && !urls.contains(&item) {
            urls.push(item);
        }
    }
    urls
}

fn is_uncertainty_level(text: &str) -> bool {
    matches!(
        text.to_lowercase().as_str(),
        "none" | "low" | "medium" | "high"
    )
}
