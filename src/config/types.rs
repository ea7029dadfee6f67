//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! API keys are read from config or the vendor environment variables and are
//! never serialized back out.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ai::provider::ProviderConfig;
use crate::ai::timeout::TimeoutConfig;
use crate::constants::{env as env_constants, network as net_constants, request, routing};
use crate::types::{ProviderId, Result, RouterError};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-provider credentials and endpoints
    pub providers: ProvidersConfig,

    /// Fallback order, timeouts and selection threshold
    pub routing: RoutingConfig,

    /// Request values used when a caller leaves them unset
    pub defaults: DefaultsConfig,
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `RouterError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        if !request::TEMPERATURE_RANGE.contains(&self.defaults.temperature) {
            return Err(RouterError::Config(format!(
                "defaults.temperature must be between 0.0 and 2.0, got {}",
                self.defaults.temperature
            )));
        }

        if self.defaults.max_tokens == 0 {
            return Err(RouterError::Config(
                "defaults.max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.routing.timeout_secs == 0 || self.routing.stream_idle_timeout_secs == 0 {
            return Err(RouterError::Config(
                "routing timeouts must be greater than 0".to_string(),
            ));
        }

        if self.routing.long_prompt_threshold == 0 {
            return Err(RouterError::Config(
                "routing.long_prompt_threshold must be greater than 0".to_string(),
            ));
        }

        if self.routing.priority.is_empty() {
            return Err(RouterError::Config(
                "routing.priority must list at least one provider".to_string(),
            ));
        }

        for (i, provider) in self.routing.priority.iter().enumerate() {
            if self.routing.priority[..i].contains(provider) {
                return Err(RouterError::Config(format!(
                    "routing.priority lists {} more than once",
                    provider
                )));
            }
        }

        for provider in ProviderId::ALL {
            if let Some(base) = &self.providers.get(provider).api_base {
                validate_api_base(provider, base)?;
            }
        }

        Ok(())
    }

    /// Fill missing keys from the vendor variables (`OPENAI_API_KEY`, ...).
    ///
    /// `lookup` reads one variable; keys already present in config win.
    pub fn resolve_vendor_keys<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for provider in ProviderId::ALL {
            let settings = self.providers.get_mut(provider);
            if settings.has_key() {
                continue;
            }
            settings.api_key = vendor_key_vars(provider)
                .iter()
                .filter_map(|var| lookup(var))
                .map(|key| key.trim().to_string())
                .find(|key| !key.is_empty());
        }
    }

    /// One adapter configuration per provider, configured or not
    pub fn provider_configs(&self) -> Vec<ProviderConfig> {
        ProviderId::ALL
            .iter()
            .map(|&provider| self.providers.get(provider).to_provider_config(provider))
            .collect()
    }

    /// Providers with a usable key, in priority order
    pub fn configured_providers(&self) -> Vec<ProviderId> {
        self.routing
            .priority
            .iter()
            .copied()
            .filter(|&p| self.providers.get(p).has_key())
            .collect()
    }

    pub fn timeouts(&self) -> TimeoutConfig {
        TimeoutConfig::new(
            Duration::from_secs(self.routing.timeout_secs),
            Duration::from_secs(self.routing.stream_idle_timeout_secs),
        )
    }
}

fn vendor_key_vars(provider: ProviderId) -> &'static [&'static str] {
    match provider {
        ProviderId::OpenAi => &[env_constants::OPENAI_API_KEY],
        ProviderId::Anthropic => &[env_constants::ANTHROPIC_API_KEY],
        ProviderId::Gemini => &[env_constants::GEMINI_API_KEY, env_constants::GOOGLE_API_KEY],
    }
}

fn validate_api_base(provider: ProviderId, base: &str) -> Result<()> {
    let parsed = url::Url::parse(base).map_err(|e| {
        RouterError::Config(format!(
            "providers.{}.api_base is not a valid URL ({}): {}",
            provider, e, base
        ))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(RouterError::Config(format!(
            "providers.{}.api_base must use http or https, got {}",
            provider, scheme
        ))),
    }
}

// =============================================================================
// Provider Configuration
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub openai: ProviderSettings,
    pub anthropic: ProviderSettings,
    pub gemini: ProviderSettings,
}

impl ProvidersConfig {
    pub fn get(&self, provider: ProviderId) -> &ProviderSettings {
        match provider {
            ProviderId::OpenAi => &self.openai,
            ProviderId::Anthropic => &self.anthropic,
            ProviderId::Gemini => &self.gemini,
        }
    }

    pub fn get_mut(&mut self, provider: ProviderId) -> &mut ProviderSettings {
        match provider {
            ProviderId::OpenAi => &mut self.openai,
            ProviderId::Anthropic => &mut self.anthropic,
            ProviderId::Gemini => &mut self.gemini,
        }
    }
}

#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Never written back out by `config show` or `config init`
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Default model (provider default when unset)
    pub model: Option<String>,

    /// API base URL (official endpoint when unset)
    pub api_base: Option<String>,
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ProviderSettings {
    pub fn has_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    pub fn to_provider_config(&self, provider: ProviderId) -> ProviderConfig {
        let mut config = ProviderConfig::new(provider, self.api_key.clone());
        if let Some(model) = self.model.as_deref().filter(|m| !m.trim().is_empty()) {
            config = config.with_model(model.trim());
        }
        if let Some(base) = &self.api_base {
            config = config.with_api_base(base.clone());
        }
        config
    }
}

// =============================================================================
// Routing Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Global fallback order after the selected provider
    pub priority: Vec<ProviderId>,

    /// Bound on one completion call or stream open
    pub timeout_secs: u64,

    /// Longest gap between streamed chunks
    pub stream_idle_timeout_secs: u64,

    /// Prompts longer than this many characters go to the analytical provider
    pub long_prompt_threshold: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            priority: routing::DEFAULT_PRIORITY.to_vec(),
            timeout_secs: net_constants::DEFAULT_TIMEOUT_SECS,
            stream_idle_timeout_secs: net_constants::STREAM_IDLE_TIMEOUT_SECS,
            long_prompt_threshold: routing::LONG_PROMPT_THRESHOLD,
        }
    }
}

// =============================================================================
// Request Defaults
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_tokens: request::DEFAULT_MAX_TOKENS,
            temperature: request::DEFAULT_TEMPERATURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            config.routing.priority,
            vec![ProviderId::Anthropic, ProviderId::OpenAi, ProviderId::Gemini]
        );
        assert!(config.configured_providers().is_empty());
    }

    #[test]
    fn test_vendor_keys_fill_missing_only() {
        let mut config = Config::default();
        config.providers.openai.api_key = Some("from-config".to_string());
        config.resolve_vendor_keys(lookup(&[
            ("OPENAI_API_KEY", "from-env"),
            ("ANTHROPIC_API_KEY", "   "),
            ("GOOGLE_API_KEY", "g-key"),
        ]));

        assert_eq!(config.providers.openai.api_key.as_deref(), Some("from-config"));
        assert!(!config.providers.anthropic.has_key());
        assert_eq!(config.providers.gemini.api_key.as_deref(), Some("g-key"));
        assert_eq!(
            config.configured_providers(),
            vec![ProviderId::OpenAi, ProviderId::Gemini]
        );
    }

    #[test]
    fn test_gemini_key_preferred_over_google_key() {
        let mut config = Config::default();
        config.resolve_vendor_keys(lookup(&[
            ("GEMINI_API_KEY", "gemini"),
            ("GOOGLE_API_KEY", "google"),
        ]));
        assert_eq!(config.providers.gemini.api_key.as_deref(), Some("gemini"));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.defaults.temperature = 2.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.routing.priority = vec![ProviderId::OpenAi, ProviderId::OpenAi];
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.routing.priority.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.routing.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.providers.anthropic.api_base = Some("ftp://example.com".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.providers.anthropic.api_base = Some("http://localhost:8080/v1".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_api_key_is_never_serialized_or_printed() {
        let mut config = Config::default();
        config.providers.anthropic.api_key = Some("sk-ant-secret".to_string());

        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(!toml.contains("sk-ant-secret"));
        assert!(!format!("{:?}", config).contains("sk-ant-secret"));
    }

    #[test]
    fn test_provider_configs_cover_all_providers() {
        let mut config = Config::default();
        config.providers.openai.api_key = Some("k".to_string());
        config.providers.openai.model = Some("gpt-4o-mini".to_string());

        let configs = config.provider_configs();
        assert_eq!(configs.len(), 3);
        assert!(configs[0].is_configured());
        assert_eq!(configs[0].model.as_deref(), Some("gpt-4o-mini"));
        assert!(!configs[1].is_configured());
    }
}
