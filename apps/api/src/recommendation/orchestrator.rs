//! Provider Orchestrator: the sequential fallback loop.
//!
//! Providers are tried strictly in priority order. A soft failure (declined
//! request shape, timeout, transport error, unparseable or empty content)
//! moves on to the next provider; the first provider that yields at least one
//! valid candidate ends the loop. If every provider soft-fails the call ends
//! with `AllProvidersExhausted`, never with a partial or empty success.

use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::llm_client::{ProviderSpec, RegisteredProvider};
use crate::recommendation::contact_link::ContactLinkResolver;
use crate::recommendation::error::{RecommendationError, SoftFailure};
use crate::recommendation::evidence::attach;
use crate::recommendation::extractor::extract;
use crate::recommendation::models::{
    AttemptOutcome, Candidate, ProviderAttempt, RecommendationResult, RequestContext,
};
use crate::recommendation::normalizer::normalize;
use crate::recommendation::prompt_builder::PromptBuilder;

pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 45_000;
pub const DEFAULT_MAX_CANDIDATES: usize = 10;

/// Read-only pipeline settings, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Provider names allowed to serve. Empty means every enabled row.
    pub enabled_providers: Vec<String>,
    pub per_provider_timeout_ms: u64,
    pub max_candidates: usize,
    /// Only providers with grounded search may serve.
    pub require_grounded_search: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            enabled_providers: Vec::new(),
            per_provider_timeout_ms: DEFAULT_PROVIDER_TIMEOUT_MS,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            require_grounded_search: false,
        }
    }
}

pub struct Recommender {
    providers: Vec<RegisteredProvider>,
    config: PipelineConfig,
    builder: PromptBuilder,
    resolver: ContactLinkResolver,
}

impl Recommender {
    /// Keeps enabled providers allowed by `config`, sorted by priority.
    pub fn new(
        providers: Vec<RegisteredProvider>,
        config: PipelineConfig,
        resolver: ContactLinkResolver,
    ) -> Self {
        let mut providers: Vec<RegisteredProvider> = providers
            .into_iter()
            .filter(|p| p.spec.is_enabled)
            .filter(|p| {
                config.enabled_providers.is_empty()
                    || config
                        .enabled_providers
                        .iter()
                        .any(|name| name.eq_ignore_ascii_case(&p.spec.name))
            })
            .collect();
        providers.sort_by_key(|p| p.spec.priority);

        Self {
            builder: PromptBuilder::new(config.max_candidates),
            providers,
            config,
            resolver,
        }
    }

    /// Specs of the providers this recommender will try, in order.
    pub fn providers(&self) -> impl Iterator<Item = &ProviderSpec> {
        self.providers.iter().map(|p| &p.spec)
    }

    pub async fn find_candidates(
        &self,
        context: &RequestContext,
    ) -> Result<RecommendationResult, RecommendationError> {
        let request_id = Uuid::new_v4();
        let span = info_span!("find_candidates", request_id = %request_id);
        self.run(request_id, context).instrument(span).await
    }

    async fn run(
        &self,
        request_id: Uuid,
        context: &RequestContext,
    ) -> Result<RecommendationResult, RecommendationError> {
        info!(
            "finding candidates: purpose={}, field={}, providers={}",
            context.purpose,
            context.field,
            self.providers.len()
        );

        let mut attempts = Vec::with_capacity(self.providers.len());

        for (index, provider) in self.providers.iter().enumerate() {
            let name = provider.spec.name.clone();
            info!("attempting provider {name}");

            match self.attempt(provider, context).await {
                Ok(candidates) => {
                    attempts.push(ProviderAttempt {
                        provider: name.clone(),
                        outcome: AttemptOutcome::Succeeded {
                            candidates: candidates.len(),
                        },
                    });
                    attempts.extend(self.providers[index + 1..].iter().map(|p| {
                        ProviderAttempt {
                            provider: p.spec.name.clone(),
                            outcome: AttemptOutcome::NotTried,
                        }
                    }));

                    // Earlier providers can only have soft-failed.
                    let degraded = index > 0;
                    info!(
                        "provider {name} returned {} candidates (degraded: {degraded})",
                        candidates.len()
                    );

                    return Ok(RecommendationResult {
                        request_id,
                        candidates,
                        provider: name,
                        degraded,
                        attempts,
                        generated_at: Utc::now(),
                    });
                }
                Err(failure) => {
                    warn!("provider {name} soft-failed: {failure}");
                    attempts.push(ProviderAttempt {
                        provider: name,
                        outcome: AttemptOutcome::SoftFailed {
                            reason: failure.to_string(),
                        },
                    });
                }
            }
        }

        warn!("all {} providers exhausted", attempts.len());
        Err(RecommendationError::AllProvidersExhausted { attempts })
    }

    async fn attempt(
        &self,
        provider: &RegisteredProvider,
        context: &RequestContext,
    ) -> Result<Vec<Candidate>, SoftFailure> {
        let spec = &provider.spec;
        if self.config.require_grounded_search && !spec.supports_grounded_search {
            return Err(SoftFailure::CapabilityMismatch(format!(
                "{} cannot serve grounded-only requests",
                spec.name
            )));
        }

        let payload = self.builder.build(context, spec);
        spec.accepts(&payload)?;

        let ms = self.config.per_provider_timeout_ms;
        let raw = tokio::time::timeout(Duration::from_millis(ms), provider.adapter.call(&payload))
            .await
            .map_err(|_| SoftFailure::Timeout { ms })??;
        debug!(
            "{} responded: {} chars, {} citations, grounded={}",
            raw.provider,
            raw.text.len(),
            raw.citations.len(),
            raw.grounded
        );

        let json = extract(&raw)?;
        let normalized = normalize(&json);
        if normalized.is_empty() {
            return Err(SoftFailure::EmptyResult);
        }

        let mut candidates: Vec<Candidate> = normalized
            .into_iter()
            .map(|c| self.resolver.resolve(attach(c, &raw.citations)))
            .collect();
        rank(&mut candidates);
        candidates.truncate(self.config.max_candidates.max(1));
        Ok(candidates)
    }
}

/// Descending score; ties keep the provider's original order.
fn rank(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        b.match_score
            .total_cmp(&a.match_score)
            .then(a.provider_rank.cmp(&b.provider_rank))
    });
}
