use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use crate::llm_client::anthropic::{self, AnthropicProvider};
use crate::llm_client::gemini::{self, GeminiProvider};
use crate::llm_client::openai::{self, OpenAiProvider};
use crate::llm_client::{
    default_provider_table, Provider, RegisteredProvider, ANTHROPIC, GEMINI, GEMINI_SEARCH, OPENAI,
};
use crate::recommendation::contact_link::DEFAULT_PROFILE_HOST;
use crate::recommendation::orchestrator::{
    PipelineConfig, DEFAULT_MAX_CANDIDATES, DEFAULT_PROVIDER_TIMEOUT_MS,
};

/// Application configuration loaded from environment variables.
/// Vendor keys are optional; a row without its key is registered disabled.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub gemini_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub gemini_model: String,
    pub openai_model: String,
    pub anthropic_model: String,
    pub gemini_base_url: String,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
    pub enabled_providers: Vec<String>,
    pub provider_timeout_ms: u64,
    pub max_candidates: usize,
    pub require_grounded_search: bool,
    pub profile_hosts: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |key: &str| var(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let or_default = |key: &str, default: &str| optional(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            port: or_default("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
            gemini_api_key: optional("GEMINI_API_KEY").or_else(|| optional("GOOGLE_API_KEY")),
            openai_api_key: optional("OPENAI_API_KEY"),
            anthropic_api_key: optional("ANTHROPIC_API_KEY"),
            gemini_model: or_default("GEMINI_MODEL", gemini::DEFAULT_MODEL),
            openai_model: or_default("OPENAI_MODEL", openai::DEFAULT_MODEL),
            anthropic_model: or_default("ANTHROPIC_MODEL", anthropic::DEFAULT_MODEL),
            gemini_base_url: or_default("GEMINI_BASE_URL", gemini::DEFAULT_BASE_URL),
            openai_base_url: or_default("OPENAI_BASE_URL", openai::DEFAULT_BASE_URL),
            anthropic_base_url: or_default("ANTHROPIC_BASE_URL", anthropic::DEFAULT_BASE_URL),
            enabled_providers: optional("ENABLED_PROVIDERS")
                .map(|v| comma_list(&v))
                .unwrap_or_default(),
            provider_timeout_ms: or_default(
                "PROVIDER_TIMEOUT_MS",
                &DEFAULT_PROVIDER_TIMEOUT_MS.to_string(),
            )
            .parse::<u64>()
            .context("PROVIDER_TIMEOUT_MS must be a whole number of milliseconds")?,
            max_candidates: positive(
                or_default("MAX_CANDIDATES", &DEFAULT_MAX_CANDIDATES.to_string())
                    .parse::<usize>()
                    .context("MAX_CANDIDATES must be a positive integer")?,
                "MAX_CANDIDATES",
            )?,
            require_grounded_search: or_default("REQUIRE_GROUNDED_SEARCH", "false")
                .parse::<bool>()
                .context("REQUIRE_GROUNDED_SEARCH must be true or false")?,
            profile_hosts: comma_list(&or_default("PROFILE_HOSTS", DEFAULT_PROFILE_HOST)),
        })
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            enabled_providers: self.enabled_providers.clone(),
            per_provider_timeout_ms: self.provider_timeout_ms,
            max_candidates: self.max_candidates,
            require_grounded_search: self.require_grounded_search,
        }
    }

    /// Binds every row of the provider table to its adapter.
    pub fn build_providers(&self) -> Result<Vec<RegisteredProvider>> {
        let timeout = Duration::from_millis(self.provider_timeout_ms);
        let mut providers = Vec::new();

        for mut spec in default_provider_table() {
            let key = match spec.name.as_str() {
                GEMINI_SEARCH | GEMINI => &self.gemini_api_key,
                OPENAI => &self.openai_api_key,
                ANTHROPIC => &self.anthropic_api_key,
                other => {
                    warn!("no adapter for provider row {other}; skipping");
                    continue;
                }
            };
            if key.is_none() {
                warn!("{} disabled: API key not set", spec.name);
                spec.is_enabled = false;
            }
            let key = key.clone().unwrap_or_default();

            let adapter: Arc<dyn Provider> = match spec.name.as_str() {
                OPENAI => Arc::new(
                    OpenAiProvider::new(&self.openai_base_url, key, self.openai_model.clone(), timeout)
                        .context("failed to build OpenAI client")?,
                ),
                ANTHROPIC => Arc::new(
                    AnthropicProvider::new(
                        &self.anthropic_base_url,
                        key,
                        self.anthropic_model.clone(),
                        timeout,
                    )
                    .context("failed to build Anthropic client")?,
                ),
                name => Arc::new(
                    GeminiProvider::new(
                        name,
                        &self.gemini_base_url,
                        key,
                        self.gemini_model.clone(),
                        timeout,
                    )
                    .context("failed to build Gemini client")?,
                ),
            };

            info!(
                "registered provider {} (priority {}, enabled: {})",
                spec.name, spec.priority, spec.is_enabled
            );
            providers.push(RegisteredProvider { spec, adapter });
        }

        Ok(providers)
    }
}

fn positive(value: usize, key: &str) -> Result<usize> {
    if value == 0 {
        bail!("{key} must be a positive integer");
    }
    Ok(value)
}

fn comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
