//! Providers Command
//!
//! Lists each provider with its configuration state.

use serde_json::json;

use crate::ai::provider::default_model;
use crate::cli::context::CommandContext;
use crate::cli::ui::Output;
use crate::types::{ProviderId, Result};

pub fn run(ctx: &CommandContext, format: &str) -> Result<()> {
    let config = &ctx.config;
    let priority = &config.routing.priority;

    let rows: Vec<_> = ProviderId::ALL
        .iter()
        .map(|&provider| {
            let settings = config.providers.get(provider);
            let model = settings
                .model
                .clone()
                .unwrap_or_else(|| default_model(provider).to_string());
            let rank = priority.iter().position(|&p| p == provider).map(|i| i + 1);
            (provider, settings.has_key(), model, settings.api_base.clone(), rank)
        })
        .collect();

    if format == "json" {
        let body: Vec<_> = rows
            .iter()
            .map(|(provider, configured, model, api_base, rank)| {
                json!({
                    "provider": provider,
                    "configured": configured,
                    "model": model,
                    "api_base": api_base,
                    "priority": rank,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let output = Output::new();
    output.section("Providers");
    for (provider, configured, model, api_base, rank) in &rows {
        let mut detail = model.clone();
        if let Some(rank) = rank {
            detail.push_str(&format!(" · priority {}", rank));
        }
        if let Some(base) = api_base {
            detail.push_str(&format!(" · {}", base));
        }
        if !configured {
            detail.push_str(" · no API key");
        }
        output.provider_status(*provider, *configured, &detail);
    }

    if config.configured_providers().is_empty() {
        output.warning(
            "No providers configured. Set OPENAI_API_KEY, ANTHROPIC_API_KEY or GEMINI_API_KEY.",
        );
    }
    Ok(())
}
