//! Complete and Stream Commands
//!
//! Usage:
//!   ai-router complete "Summarize this memo" [--provider openai] [--json]
//!   ai-router stream - < prompt.txt

use std::io::{Read, Write};

use clap::Args;
use futures::StreamExt;
use serde_json::json;

use crate::cli::context::CommandContext;
use crate::cli::ui::Output;
use crate::types::{CompletionRequest, ProviderOverride, Result};

/// Request options shared by `complete` and `stream`
#[derive(Debug, Clone, Args)]
pub struct RequestArgs {
    /// Prompt text, or "-" to read it from stdin
    pub prompt: String,

    #[arg(long, short, help = "System prompt")]
    pub system: Option<String>,

    #[arg(
        long,
        short,
        default_value = "auto",
        help = "Provider: auto, openai, anthropic, gemini"
    )]
    pub provider: ProviderOverride,

    #[arg(long, short, help = "Model override (ignored by other providers)")]
    pub model: Option<String>,

    #[arg(long, help = "Maximum completion tokens")]
    pub max_tokens: Option<u32>,

    #[arg(long, help = "Sampling temperature (0.0-2.0)")]
    pub temperature: Option<f32>,
}

impl RequestArgs {
    pub fn into_request(self) -> Result<CompletionRequest> {
        let prompt = if self.prompt == "-" {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        } else {
            self.prompt
        };

        let mut request = CompletionRequest::new(prompt).with_provider(self.provider);
        request.system_prompt = self.system;
        request.model = self.model;
        request.max_tokens = self.max_tokens;
        request.temperature = self.temperature;
        Ok(request)
    }
}

/// Run one completion with fallback
pub async fn complete(ctx: &CommandContext, args: RequestArgs, json_output: bool) -> Result<()> {
    let request = args.into_request()?;
    let (response, report) = ctx.router.execute(&request).await?;

    if json_output {
        let body = json!({ "response": response, "route": report });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("{}", response.content);

    let output = Output::new();
    if report.fell_back() {
        output.warning(&format!(
            "{} unavailable, served by {}",
            report.selected, response.provider_used
        ));
    }
    output.usage_footer(&response);
    Ok(())
}

/// Stream one completion from a single provider
pub async fn stream(ctx: &CommandContext, args: RequestArgs) -> Result<()> {
    let request = args.into_request()?;
    let mut chunks = ctx.router.stream(&request);
    let mut stdout = std::io::stdout();
    let mut received = false;

    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(text) => {
                received = true;
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
            }
            Err(e) => {
                if received {
                    println!();
                }
                return Err(e);
            }
        }
    }

    if received {
        println!();
    } else {
        Output::new().warning("Stream ended without any content");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderId;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        request: RequestArgs,
    }

    #[test]
    fn test_args_map_onto_request() {
        let cli = TestCli::parse_from([
            "ai-router",
            "Draft an NDA",
            "--provider",
            "gemini",
            "--system",
            "be formal",
            "--max-tokens",
            "300",
        ]);
        let request = cli.request.into_request().unwrap();

        assert_eq!(request.prompt, "Draft an NDA");
        assert_eq!(request.provider.concrete(), Some(ProviderId::Gemini));
        assert_eq!(request.system(), Some("be formal"));
        assert_eq!(request.max_tokens, Some(300));
        assert_eq!(request.temperature, None);
    }

    #[test]
    fn test_provider_defaults_to_auto() {
        let cli = TestCli::parse_from(["ai-router", "hello"]);
        assert_eq!(cli.request.provider, ProviderOverride::Auto);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        assert!(TestCli::try_parse_from(["ai-router", "hi", "--provider", "mistral"]).is_err());
    }
}
