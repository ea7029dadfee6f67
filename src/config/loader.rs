//! Configuration Loader (Figment-based)
//!
//! Loads and merges configuration from multiple sources using Figment:
//! 1. Built-in defaults (Serialized)
//! 2. Global config (platform config dir, e.g. ~/.config/ai-router/config.toml)
//! 3. Project config (./ai-router.toml)
//! 4. Environment variables (AI_ROUTER_* prefix, `__` separates sections)
//!
//! Vendor API key variables (`OPENAI_API_KEY`, ...) fill any key still
//! missing after the merge.

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::types::Config;
use crate::constants::env as env_constants;
use crate::types::{Result, RouterError};

const PROJECT_CONFIG_FILE: &str = "ai-router.toml";

/// Configuration loader
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with full resolution chain:
    /// defaults → global → project → env vars → vendor key variables
    pub fn load() -> Result<Config> {
        let mut config: Config = Self::figment()
            .extract()
            .map_err(|e| RouterError::Config(format!("Configuration error: {}", e)))?;

        config.resolve_vendor_keys(|var| env::var(var).ok());
        config.validate()?;

        debug!(configured = ?config.configured_providers(), "Configuration loaded");
        Ok(config)
    }

    /// The merged sources, without vendor keys or validation
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        if let Some(global_path) = Self::global_config_path()
            && global_path.exists()
        {
            debug!("Loading global config from: {}", global_path.display());
            figment = figment.merge(Toml::file(&global_path));
        }

        let project_path = Self::project_config_path();
        if project_path.exists() {
            debug!("Loading project config from: {}", project_path.display());
            figment = figment.merge(Toml::file(&project_path));
        }

        // e.g. AI_ROUTER_ROUTING__TIMEOUT_SECS -> routing.timeout_secs
        figment.merge(Env::prefixed(env_constants::CONFIG_PREFIX).split("__"))
    }

    /// Load configuration from a specific file only
    pub fn load_from_file(path: &Path) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .extract()
            .map_err(|e| RouterError::Config(format!("Configuration error: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    // =========================================================================
    // Path Management
    // =========================================================================

    /// Global config directory (e.g. ~/.config/ai-router/)
    pub fn global_dir() -> Option<PathBuf> {
        ProjectDirs::from("", "", "ai-router").map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        Self::global_dir().map(|dir| dir.join("config.toml"))
    }

    pub fn project_config_path() -> PathBuf {
        PathBuf::from(PROJECT_CONFIG_FILE)
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Write the default global config; returns its path
    pub fn init_global(force: bool) -> Result<PathBuf> {
        let path = Self::global_config_path().ok_or_else(|| {
            RouterError::Config("Cannot determine global config directory".to_string())
        })?;
        Self::write_template(&path, force)?;
        Ok(path)
    }

    /// Write the default project config in the current directory
    pub fn init_project(force: bool) -> Result<PathBuf> {
        let path = Self::project_config_path();
        Self::write_template(&path, force)?;
        Ok(path)
    }

    /// Write the default template to `path`, keeping an existing file unless
    /// `force`. Returns whether the file was written.
    pub fn write_template(path: &Path, force: bool) -> Result<bool> {
        if path.exists() && !force {
            info!("Config exists: {}", path.display());
            return Ok(false);
        }
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, Self::default_config())?;
        info!("Created config: {}", path.display());
        Ok(true)
    }

    /// Default config content (TOML)
    fn default_config() -> String {
        r#"# ai-router configuration
# Project settings in ./ai-router.toml override the global file.
# API keys are best left to OPENAI_API_KEY, ANTHROPIC_API_KEY and GEMINI_API_KEY.

[providers.openai]
# model = "gpt-4o"
# api_base = "https://api.openai.com/v1"

[providers.anthropic]
# model = "claude-3-5-sonnet-20241022"

[providers.gemini]
# model = "gemini-1.5-pro"

[routing]
# Tried in this order after the selected provider
priority = ["anthropic", "openai", "gemini"]
timeout_secs = 120
stream_idle_timeout_secs = 60
long_prompt_threshold = 10000

[defaults]
max_tokens = 2000
temperature = 0.7
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderId;
    use figment::Jail;
    use tempfile::TempDir;

    #[test]
    fn test_default_template_loads_and_validates() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        assert!(ConfigLoader::write_template(&path, false).unwrap());
        assert!(!ConfigLoader::write_template(&path, false).unwrap());
        assert!(ConfigLoader::write_template(&path, true).unwrap());

        let config = ConfigLoader::load_from_file(&path).unwrap();
        assert_eq!(config.routing.timeout_secs, 120);
        assert_eq!(config.routing.priority[0], ProviderId::Anthropic);
    }

    #[test]
    fn test_project_file_and_env_layering() {
        Jail::expect_with(|jail| {
            jail.create_file(
                PROJECT_CONFIG_FILE,
                r#"
                [providers.openai]
                model = "gpt-4o-mini"

                [routing]
                priority = ["gemini", "openai"]
                timeout_secs = 45
                "#,
            )?;
            jail.set_env("AI_ROUTER_ROUTING__TIMEOUT_SECS", "30");
            jail.set_env("AI_ROUTER_DEFAULTS__MAX_TOKENS", "512");

            let config: Config = ConfigLoader::figment().extract()?;
            assert_eq!(config.providers.openai.model.as_deref(), Some("gpt-4o-mini"));
            assert_eq!(config.routing.priority, vec![ProviderId::Gemini, ProviderId::OpenAi]);
            assert_eq!(config.routing.timeout_secs, 30);
            assert_eq!(config.defaults.max_tokens, 512);
            assert_eq!(config.routing.stream_idle_timeout_secs, 60);
            Ok(())
        });
    }

    #[test]
    fn test_env_api_key_nested_under_provider() {
        Jail::expect_with(|jail| {
            jail.set_env("AI_ROUTER_PROVIDERS__ANTHROPIC__API_KEY", "sk-ant-env");

            let config: Config = ConfigLoader::figment().extract()?;
            assert!(config.providers.anthropic.has_key());
            assert!(!config.providers.openai.has_key());
            Ok(())
        });
    }

    #[test]
    fn test_invalid_file_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.toml");
        fs::write(&path, "[defaults]\ntemperature = 9.0\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(matches!(err, RouterError::Config(_)));
    }
}
