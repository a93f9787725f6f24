//! Contact Link Resolver: confirms a provider-proposed profile URL or falls
//! back to a search link the user verifies themselves.
//!
//! A profile link is emitted only when the URL is a well-formed profile page
//! on a known host AND its slug is plausibly derived from the candidate's
//! name. Everything else degrades to `LinkKind::Search`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, info};
use url::{form_urlencoded, Url};

use crate::recommendation::models::{Candidate, ContactLink, LinkKind};

pub const DEFAULT_PROFILE_HOST: &str = "linkedin.com";
pub const SEARCH_URL: &str = "https://www.linkedin.com/search/results/people/";

/// Path prefix of a profile page on every accepted host.
const PROFILE_PATH_PREFIX: &str = "in";

/// Link shorteners, search engines and redirectors. Never a profile.
const REDIRECT_HOSTS: &[&str] = &[
    "lnkd.in",
    "t.co",
    "bit.ly",
    "goo.gl",
    "google.com",
    "bing.com",
    "duckduckgo.com",
    "l.facebook.com",
    "vertexaisearch.cloud.google.com",
];

const REDIRECT_QUERY_KEYS: &[&str] = &["url", "u", "redirect", "redirect_url", "dest", "target"];

/// Letters in a slug that no name token or initial accounts for.
const MAX_UNEXPLAINED_LETTERS: usize = 3;

static SLUG_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]{1,99}$").expect("valid regex"));

static ORGANIZATION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|\s)at\s+(?P<at>.+)|@\s*(?P<sym>.+)").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkRejection {
    #[error("not an absolute http(s) URL")]
    NotWebUrl,

    #[error("{0} is a redirect or search host")]
    RedirectHost(String),

    #[error("URL carries a redirect parameter")]
    RedirectParameter,

    #[error("{0} is not a known profile host")]
    UnknownHost(String),

    #[error("path is not a profile page")]
    NotAProfilePath,

    #[error("slug has an unexpected shape")]
    MalformedSlug,

    #[error("slug does not contain the candidate's name")]
    SlugWithoutName,

    #[error("slug mixes the name with unrelated words ({0})")]
    SlugWithUnrelatedWords(String),
}

#[derive(Debug, Clone)]
pub struct ContactLinkResolver {
    profile_hosts: Vec<String>,
}

impl Default for ContactLinkResolver {
    fn default() -> Self {
        Self::new(vec![DEFAULT_PROFILE_HOST.to_string()])
    }
}

impl ContactLinkResolver {
    pub fn new(profile_hosts: Vec<String>) -> Self {
        Self {
            profile_hosts: profile_hosts
                .into_iter()
                .map(|h| h.trim().trim_start_matches("www.").to_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// Sets `contact_link` and consumes `proposed_profile_url`.
    pub fn resolve(&self, mut candidate: Candidate) -> Candidate {
        let proposed = candidate.proposed_profile_url.take();

        candidate.contact_link = match proposed {
            Some(url) => match self.validate_profile_url(&url, &candidate.name) {
                Ok(canonical) => ContactLink {
                    url: canonical,
                    kind: LinkKind::Profile,
                },
                Err(rejection) => {
                    info!(
                        "rejected proposed profile link for {}: {rejection}",
                        candidate.name
                    );
                    search_link(&candidate.name, &candidate.position)
                }
            },
            None => search_link(&candidate.name, &candidate.position),
        };
        candidate
    }

    /// Returns the canonical profile URL (no query, no fragment) when valid.
    pub fn validate_profile_url(&self, raw: &str, name: &str) -> Result<String, LinkRejection> {
        let url = Url::parse(raw.trim()).map_err(|_| LinkRejection::NotWebUrl)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(LinkRejection::NotWebUrl);
        }
        let host = url
            .host_str()
            .ok_or(LinkRejection::NotWebUrl)?
            .to_lowercase();

        if REDIRECT_HOSTS
            .iter()
            .any(|r| host == *r || host.ends_with(&format!(".{r}")))
        {
            return Err(LinkRejection::RedirectHost(host));
        }
        if url
            .query_pairs()
            .any(|(k, _)| REDIRECT_QUERY_KEYS.contains(&k.as_ref()))
        {
            return Err(LinkRejection::RedirectParameter);
        }

        let profile_host = self
            .matching_host(&host)
            .ok_or_else(|| LinkRejection::UnknownHost(host.clone()))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let slug = match segments.as_slice() {
            [prefix, slug] if prefix.eq_ignore_ascii_case(PROFILE_PATH_PREFIX) => *slug,
            _ => return Err(LinkRejection::NotAProfilePath),
        };
        if !SLUG_SHAPE.is_match(slug) {
            return Err(LinkRejection::MalformedSlug);
        }

        check_slug_against_name(slug, name)?;

        Ok(format!(
            "https://www.{profile_host}/{PROFILE_PATH_PREFIX}/{slug}"
        ))
    }

    /// Accepts the bare host, `www.`/`m.` and two-letter country subdomains.
    fn matching_host(&self, host: &str) -> Option<&str> {
        self.profile_hosts.iter().map(String::as_str).find(|allowed| {
            if host == *allowed {
                return true;
            }
            host.strip_suffix(allowed)
                .and_then(|prefix| prefix.strip_suffix('.'))
                .map(|sub| sub == "www" || sub == "m" || (sub.len() == 2 && sub.chars().all(|c| c.is_ascii_lowercase())))
                .unwrap_or(false)
        })
    }
}

/// Heuristic fake-slug filter.
///
/// Strips id-like segments ("8a7b6c5", "12345") and digits, removes every
/// name token found, then allows a few leftover letters (initials, "phd").
/// A slug with no name token, or with a leftover word, is treated as guessed.
fn check_slug_against_name(slug: &str, name: &str) -> Result<(), LinkRejection> {
    let mut tokens: Vec<String> = name
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| t.len() >= 2)
        .map(|t| t.chars().filter(|c| c.is_ascii_alphabetic()).collect::<String>())
        .filter(|t| t.len() >= 2)
        .collect();
    if tokens.is_empty() {
        return Err(LinkRejection::SlugWithoutName);
    }
    let initials: Vec<char> = tokens.iter().filter_map(|t| t.chars().next()).collect();
    tokens.sort_by_key(|t| std::cmp::Reverse(t.len()));

    let mut core: String = slug
        .to_lowercase()
        .split(['-', '_'])
        .filter(|seg| !is_id_segment(seg))
        .collect::<String>()
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();

    let mut matched = false;
    for token in &tokens {
        if core.contains(token.as_str()) {
            core = core.replacen(token.as_str(), "", 1);
            matched = true;
        }
    }
    if !matched {
        return Err(LinkRejection::SlugWithoutName);
    }

    let unexplained: String = core.chars().filter(|c| !initials.contains(c)).collect();
    if unexplained.len() > MAX_UNEXPLAINED_LETTERS {
        debug!("slug {slug} leftover after name removal: {core}");
        return Err(LinkRejection::SlugWithUnrelatedWords(core));
    }
    Ok(())
}

fn is_id_segment(segment: &str) -> bool {
    let has_digit = segment.chars().any(|c| c.is_ascii_digit());
    has_digit
        && (segment.chars().all(|c| c.is_ascii_digit())
            || (segment.len() >= 5 && segment.chars().all(|c| c.is_ascii_alphanumeric())))
}

/// Text after "at" / "@" in a position, cut at the first separator.
pub fn organization_from_position(position: &str) -> String {
    let Some(caps) = ORGANIZATION_MARKER.captures(position) else {
        return String::new();
    };
    let tail = caps
        .name("at")
        .or_else(|| caps.name("sym"))
        .map(|m| m.as_str())
        .unwrap_or_default();

    let cut = [",", "(", "|", ";", " - ", " · "]
        .iter()
        .filter_map(|sep| tail.find(sep))
        .min()
        .unwrap_or(tail.len());
    tail[..cut].trim().trim_end_matches('.').trim().to_string()
}

/// Search entry point for a person: name plus organization, if any.
pub fn search_link(name: &str, position: &str) -> ContactLink {
    let organization = organization_from_position(position);
    let query = if organization.is_empty() {
        name.trim().to_string()
    } else {
        format!("{} {}", name.trim(), organization)
    };
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();

    ContactLink {
        url: format!("{SEARCH_URL}?keywords={encoded}"),
        kind: LinkKind::Search,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recommendation::models::Uncertainty;

    fn candidate(name: &str, position: &str, proposed: Option<&str>) -> Candidate {
        Candidate {
            name: name.to_string(),
            position: position.to_string(),
            match_score: 50.0,
            match_reason: "Relevant".to_string(),
            evidence: vec![],
            sources: vec![],
            uncertainty: Uncertainty::High,
            contact_link: search_link(name, position),
            caveat: None,
            proposed_profile_url: proposed.map(str::to_string),
            provider_rank: 0,
        }
    }

    #[test]
    fn test_guessed_slug_is_replaced_with_search_link() {
        let resolver = ContactLinkResolver::new(vec!["examplesocial.com".to_string()]);
        let out = resolver.resolve(candidate(
            "Jane Doe",
            "VP at Example Bank",
            Some("https://examplesocial.com/in/janedoeconsulting"),
        ));
        assert_eq!(out.contact_link.kind, LinkKind::Search);
        assert_eq!(
            out.contact_link.url,
            format!("{SEARCH_URL}?keywords=Jane+Doe+Example+Bank")
        );
        assert!(out.proposed_profile_url.is_none());
    }

    #[test]
    fn test_guessed_slug_rejection_reason() {
        let resolver = ContactLinkResolver::new(vec!["examplesocial.com".to_string()]);
        assert_eq!(
            resolver
                .validate_profile_url("https://examplesocial.com/in/janedoeconsulting", "Jane Doe")
                .unwrap_err(),
            LinkRejection::SlugWithUnrelatedWords("consulting".to_string())
        );
    }

    #[test]
    fn test_plausible_profile_is_accepted_and_canonicalized() {
        let resolver = ContactLinkResolver::default();
        let out = resolver.resolve(candidate(
            "Jane Doe",
            "VP at Example Bank",
            Some("https://uk.linkedin.com/in/jane-doe-8a7b6c5/?trk=public_profile#about"),
        ));
        assert_eq!(out.contact_link.kind, LinkKind::Profile);
        assert_eq!(
            out.contact_link.url,
            "https://www.linkedin.com/in/jane-doe-8a7b6c5"
        );
    }

    #[test]
    fn test_slug_variants() {
        let resolver = ContactLinkResolver::default();
        let ok = |url: &str, name: &str| resolver.validate_profile_url(url, name).is_ok();

        assert!(ok("https://www.linkedin.com/in/janedoe", "Jane Doe"));
        assert!(ok("https://www.linkedin.com/in/jdoe", "Jane Doe"));
        assert!(ok("https://linkedin.com/in/jane-doe-42", "Jane Doe"));
        assert!(ok("https://www.linkedin.com/in/doe-jane-phd", "Dr. Jane Doe"));
        assert!(!ok("https://www.linkedin.com/in/johnsmith", "Jane Doe"));
        assert!(!ok("https://www.linkedin.com/in/jane-doe-finance-expert", "Jane Doe"));
    }

    #[test]
    fn test_non_profile_shapes_rejected() {
        let resolver = ContactLinkResolver::default();
        let reject = |url: &str| resolver.validate_profile_url(url, "Jane Doe").unwrap_err();

        assert_eq!(reject("linkedin.com/in/janedoe"), LinkRejection::NotWebUrl);
        assert_eq!(reject("mailto:jane@example.com"), LinkRejection::NotWebUrl);
        assert_eq!(
            reject("https://www.linkedin.com/search/results/people/?keywords=jane"),
            LinkRejection::NotAProfilePath
        );
        assert_eq!(
            reject("https://www.linkedin.com/in/janedoe/details/experience"),
            LinkRejection::NotAProfilePath
        );
        assert_eq!(
            reject("https://lnkd.in/abc123"),
            LinkRejection::RedirectHost("lnkd.in".to_string())
        );
        assert_eq!(
            reject("https://www.google.com/url?q=https://linkedin.com/in/janedoe"),
            LinkRejection::RedirectHost("www.google.com".to_string())
        );
        assert_eq!(
            reject("https://www.linkedin.com/in/janedoe?redirect=https://evil.example"),
            LinkRejection::RedirectParameter
        );
        assert_eq!(
            reject("https://linkedin.com.evil.example/in/janedoe"),
            LinkRejection::UnknownHost("linkedin.com.evil.example".to_string())
        );
        assert_eq!(
            reject("https://www.linkedin.com/in/jane%20doe"),
            LinkRejection::MalformedSlug
        );
    }

    #[test]
    fn test_missing_proposal_yields_search_link() {
        let out = ContactLinkResolver::default().resolve(candidate("Ana Li", "Professor", None));
        assert_eq!(out.contact_link.kind, LinkKind::Search);
        assert_eq!(out.contact_link.url, format!("{SEARCH_URL}?keywords=Ana+Li"));
    }

    #[test]
    fn test_organization_extraction() {
        assert_eq!(organization_from_position("VP at Example Bank"), "Example Bank");
        assert_eq!(organization_from_position("Engineer @Stripe"), "Stripe");
        assert_eq!(
            organization_from_position("Associate Professor at MIT, CSAIL"),
            "MIT"
        );
        assert_eq!(organization_from_position("at Acme Corp."), "Acme Corp");
        assert_eq!(organization_from_position("Independent consultant"), "");
        assert_eq!(organization_from_position("Data Engineer"), "");
    }

    #[test]
    fn test_search_link_encodes_query() {
        let link = search_link("José Núñez", "CTO at R&D Labs");
        assert_eq!(link.kind, LinkKind::Search);
        assert!(link.url.starts_with(SEARCH_URL));
        assert!(link.url.contains("R%26D+Labs"));
        assert!(!link.url.contains(' '));
    }
}
