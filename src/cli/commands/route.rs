//! Route Command
//!
//! Shows which provider a prompt would go to and the fallback order,
//! without calling any provider.

use serde_json::json;

use crate::cli::context::CommandContext;
use crate::cli::ui::Output;
use crate::types::{CompletionRequest, ProviderOverride, Result};

pub fn run(
    ctx: &CommandContext,
    prompt: &str,
    provider: ProviderOverride,
    format: &str,
) -> Result<()> {
    let request = CompletionRequest::new(prompt).with_provider(provider);
    request.validate()?;

    let router = &ctx.router;
    let selected = router.selector().select(&request);
    let plan = router.plan(&request);
    let reason = if provider.concrete().is_some() {
        "explicit override"
    } else {
        "heuristic"
    };

    if format == "json" {
        let body = json!({
            "selected": selected,
            "reason": reason,
            "plan": plan,
            "prompt_chars": request.prompt.chars().count(),
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let output = Output::new();
    output.section("Route");
    output.kv("Selected", format!("{} ({})", selected, reason));
    output.kv("Prompt", format!("{} chars", request.prompt.chars().count()));

    if plan.is_empty() {
        output.warning("No providers are configured; the request would fail");
        return Ok(());
    }

    let order: Vec<&str> = plan.iter().map(|p| p.as_str()).collect();
    output.kv("Plan", order.join(" → "));
    if plan.first() != Some(&selected) {
        output.info(&format!("{} is not configured and would be skipped", selected));
    }
    Ok(())
}
