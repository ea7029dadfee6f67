//! Request and Response Types
//!
//! Provider-neutral shapes exchanged between callers, the router and adapters.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::{Result, RouterError};
use crate::constants::request as request_constants;

// =============================================================================
// Provider Identity
// =============================================================================

/// A concrete language-model vendor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderId {
    pub const ALL: [ProviderId; 3] = [ProviderId::OpenAi, ProviderId::Anthropic, ProviderId::Gemini];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::OpenAi => "openai",
            ProviderId::Anthropic => "anthropic",
            ProviderId::Gemini => "gemini",
        }
    }

    /// Stable index into per-provider tables
    pub(crate) fn index(&self) -> usize {
        match self {
            ProviderId::OpenAi => 0,
            ProviderId::Anthropic => 1,
            ProviderId::Gemini => 2,
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderId::OpenAi),
            "anthropic" | "claude" => Ok(ProviderId::Anthropic),
            "gemini" | "google" => Ok(ProviderId::Gemini),
            _ => Err(format!(
                "Unknown provider '{}'. Valid values: openai, anthropic, gemini",
                s
            )),
        }
    }
}

/// Caller's provider preference: a concrete provider or automatic selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderOverride {
    #[default]
    Auto,
    #[serde(rename = "openai")]
    OpenAi,
    Anthropic,
    Gemini,
}

impl ProviderOverride {
    /// The concrete provider, or `None` for automatic selection
    pub fn concrete(&self) -> Option<ProviderId> {
        match self {
            ProviderOverride::Auto => None,
            ProviderOverride::OpenAi => Some(ProviderId::OpenAi),
            ProviderOverride::Anthropic => Some(ProviderId::Anthropic),
            ProviderOverride::Gemini => Some(ProviderId::Gemini),
        }
    }
}

impl From<ProviderId> for ProviderOverride {
    fn from(id: ProviderId) -> Self {
        match id {
            ProviderId::OpenAi => ProviderOverride::OpenAi,
            ProviderId::Anthropic => ProviderOverride::Anthropic,
            ProviderId::Gemini => ProviderOverride::Gemini,
        }
    }
}

impl std::str::FromStr for ProviderOverride {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            return Ok(ProviderOverride::Auto);
        }
        s.parse::<ProviderId>().map(ProviderOverride::from)
    }
}

// =============================================================================
// Chat Messages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Completion Request
// =============================================================================

/// A single completion request.
///
/// `history` is forwarded verbatim and in order, followed by `prompt` as the
/// trailing user message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub provider: ProviderOverride,
    #[serde(default)]
    pub model: Option<String>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }

    pub fn with_system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_provider(mut self, provider: impl Into<ProviderOverride>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn effective_max_tokens(&self) -> u32 {
        self.max_tokens
            .unwrap_or(request_constants::DEFAULT_MAX_TOKENS)
    }

    pub fn effective_temperature(&self) -> f32 {
        self.temperature
            .unwrap_or(request_constants::DEFAULT_TEMPERATURE)
    }

    /// History followed by the trailing user prompt
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() + 1);
        messages.extend(self.history.iter().cloned());
        messages.push(ChatMessage::user(self.prompt.clone()));
        messages
    }

    /// Non-empty system prompt, if any
    pub fn system(&self) -> Option<&str> {
        self.system_prompt
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Reject requests no provider could serve
    pub fn validate(&self) -> Result<()> {
        if self.prompt.trim().is_empty() {
            return Err(RouterError::InvalidRequest(
                "prompt must not be empty".to_string(),
            ));
        }
        if self.max_tokens == Some(0) {
            return Err(RouterError::InvalidRequest(
                "max_tokens must be greater than 0".to_string(),
            ));
        }
        if let Some(t) = self.temperature
            && !request_constants::TEMPERATURE_RANGE.contains(&t)
        {
            return Err(RouterError::InvalidRequest(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                t
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Completion Response
// =============================================================================

/// Token usage reported by a provider. All zero when the provider reports none.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt: u32,
    pub completion: u32,
    pub total: u32,
}

impl TokenUsage {
    pub fn new(prompt: u32, completion: u32) -> Self {
        Self {
            prompt,
            completion,
            total: prompt.saturating_add(completion),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

/// Normalized completion result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub provider_used: ProviderId,
    pub model_used: String,
    pub tokens: TokenUsage,
    pub estimated_cost_usd: f64,
    /// Wall clock time of the successful adapter call
    #[serde(default)]
    pub latency_ms: u64,
}
