//! CLI command context
//!
//! Loads configuration once and builds the shared router every command uses.

use std::path::Path;
use std::sync::Arc;

use uuid::Uuid;

use crate::ai::metrics::{SharedMetrics, create_shared_metrics};
use crate::ai::router::{AiRouterBuilder, SharedRouter};
use crate::config::{Config, ConfigLoader};
use crate::types::Result;

/// Command execution context
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub config: Config,
    pub router: SharedRouter,
    pub metrics: SharedMetrics,
}

impl CommandContext {
    /// Load config (from `config_path` when given) and build the router
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                let mut config = ConfigLoader::load_from_file(path)?;
                config.resolve_vendor_keys(|var| std::env::var(var).ok());
                config
            }
            None => ConfigLoader::load()?,
        };
        Self::from_config(config)
    }

    pub fn from_config(config: Config) -> Result<Self> {
        let metrics = create_shared_metrics(Uuid::new_v4().to_string());

        let router = AiRouterBuilder::from_config(&config)?
            .metrics(metrics.clone())
            .build();

        Ok(Self {
            config,
            router: Arc::new(router),
            metrics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderId;

    #[test]
    fn test_router_shares_context_metrics() {
        let mut config = Config::default();
        config.providers.gemini.api_key = Some("g-key".to_string());

        let ctx = CommandContext::from_config(config).unwrap();
        assert_eq!(ctx.router.configured_providers(), vec![ProviderId::Gemini]);

        let router_metrics = ctx.router.metrics().unwrap();
        assert!(Arc::ptr_eq(router_metrics, &ctx.metrics));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut config = Config::default();
        config.defaults.max_tokens = 0;
        assert!(CommandContext::from_config(config).is_err());
    }
}
