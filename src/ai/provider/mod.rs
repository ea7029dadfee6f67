//! LLM Provider Abstraction
//!
//! Defines the `ProviderAdapter` trait: one implementation per vendor, each
//! translating a `CompletionRequest` into exactly one native API call and the
//! reply back into a `CompletionResponse`.
//!
//! ## Modules
//!
//! - `openai`: OpenAI Chat Completions API
//! - `anthropic`: Anthropic Messages API
//! - `gemini`: Google Gemini generateContent API
//! - `sse`: server-sent-events decoder shared by the streaming variants
//!
//! Adapters never retry. Retrying across providers belongs to the router.

mod anthropic;
mod gemini;
mod openai;
pub mod sse;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

use async_trait::async_trait;
use futures::Stream;
use secrecy::{ExposeSecret, SecretString};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::ai::pricing;
use crate::constants::{models, network as net_constants};
use crate::types::{
    CompletionRequest, CompletionResponse, ErrorClassifier, ProviderId, Result, RouterError,
    TokenUsage,
};

/// Lazy, single-pass sequence of text fragments in provider order
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Shared adapter type held by the router
pub type SharedAdapter = Arc<dyn ProviderAdapter>;

// =============================================================================
// Provider Configuration
// =============================================================================

/// Resolved, immutable settings for one provider.
///
/// A provider is configured when its trimmed API key is non-empty.
pub struct ProviderConfig {
    pub provider: ProviderId,
    api_key: Option<SecretString>,
    pub model: Option<String>,
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("provider", &self.provider)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ProviderConfig {
    pub fn new(provider: ProviderId, api_key: Option<String>) -> Self {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .map(SecretString::from);
        Self {
            provider,
            api_key,
            model: None,
            api_base: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Split into key, default model and API base for an adapter
    pub(crate) fn into_parts(self, default_base: &str) -> (Option<SecretString>, String, String) {
        let model = self
            .model
            .unwrap_or_else(|| default_model(self.provider).to_string());
        let api_base = self
            .api_base
            .unwrap_or_else(|| default_base.to_string())
            .trim_end_matches('/')
            .to_string();
        (self.api_key, model, api_base)
    }
}

// =============================================================================
// Adapter Trait
// =============================================================================

#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Model used when the request carries no matching override
    fn default_model(&self) -> &str;

    /// Whether an API key is present. Unconfigured adapters are never attempted.
    fn is_configured(&self) -> bool;

    /// One non-streaming completion
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse>;

    /// Open one streaming completion.
    ///
    /// Errors before the stream is returned mean no chunk was produced.
    async fn stream(&self, request: &CompletionRequest) -> Result<ChunkStream>;

    /// Model for `request`: its override when it belongs to this provider
    fn model_for(&self, request: &CompletionRequest) -> String {
        resolve_model(self.id(), request.model.as_deref(), self.default_model())
    }
}

/// Use `requested` if it follows `provider`'s naming convention, otherwise `fallback`
pub fn resolve_model(provider: ProviderId, requested: Option<&str>, fallback: &str) -> String {
    let prefixes = match provider {
        ProviderId::OpenAi => models::OPENAI_PREFIXES,
        ProviderId::Anthropic => models::ANTHROPIC_PREFIXES,
        ProviderId::Gemini => models::GEMINI_PREFIXES,
    };
    match requested.map(str::trim) {
        Some(model) if prefixes.iter().any(|p| model.starts_with(p)) => model.to_string(),
        _ => fallback.to_string(),
    }
}

pub fn default_model(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::OpenAi => models::OPENAI_DEFAULT,
        ProviderId::Anthropic => models::ANTHROPIC_DEFAULT,
        ProviderId::Gemini => models::GEMINI_DEFAULT,
    }
}

/// Create a shared adapter from configuration
pub fn create_adapter(config: ProviderConfig) -> Result<SharedAdapter> {
    Ok(match config.provider {
        ProviderId::OpenAi => Arc::new(OpenAiProvider::new(config)?),
        ProviderId::Anthropic => Arc::new(AnthropicProvider::new(config)?),
        ProviderId::Gemini => Arc::new(GeminiProvider::new(config)?),
    })
}

// =============================================================================
// Shared Adapter Helpers
// =============================================================================

/// HTTP client with a connect timeout only; the router bounds each call
pub(crate) fn build_http_client(provider: ProviderId) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(net_constants::CONNECTION_TIMEOUT_SECS))
        .build()
        .map_err(|e| RouterError::Config(format!("Failed to create HTTP client for {}: {}", provider, e)))
}

/// The key, or a fail-fast error before any network call
pub(crate) fn require_key(provider: ProviderId, key: &Option<SecretString>) -> Result<&str> {
    key.as_ref()
        .map(|k| k.expose_secret())
        .ok_or(RouterError::NotConfigured(provider))
}

/// Transport failure while sending a request
pub(crate) fn transport_error(provider: ProviderId, err: reqwest::Error) -> RouterError {
    RouterError::provider(provider, format!("{} request failed: {}", provider, err))
}

/// Turn a non-2xx response into a classified provider error
pub(crate) async fn check_status(
    provider: ProviderId,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(RouterError::Llm(ErrorClassifier::classify_http_status(
        status.as_u16(),
        &format!("{} API error ({}): {}", provider, status, body.trim()),
        provider,
    )))
}

/// Normalized response with cost priced from the model table
pub(crate) fn priced_response(
    provider: ProviderId,
    model: String,
    content: String,
    usage: TokenUsage,
    elapsed: Duration,
) -> CompletionResponse {
    let estimated_cost_usd = pricing::estimate_cost(&model, &usage);
    CompletionResponse {
        content,
        provider_used: provider,
        model_used: model,
        tokens: usage,
        estimated_cost_usd,
        latency_ms: elapsed.as_millis() as u64,
    }
}
