use console::style;

use crate::types::{CompletionResponse, ProviderId};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        println!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        println!("{} {}", style("ℹ").blue(), message);
    }

    pub fn section(&self, message: &str) {
        println!("\n{}", style(message).bold());
        println!("{}", "─".repeat(40));
    }

    /// Aligned `key: value` line
    pub fn kv(&self, key: &str, value: impl std::fmt::Display) {
        println!("  {:<12} {}", style(format!("{}:", key)).dim(), value);
    }

    pub fn provider_status(&self, provider: ProviderId, configured: bool, detail: &str) {
        let mark = if configured {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {} {:<10} {}", mark, provider.as_str(), style(detail).dim());
    }

    /// One-line summary printed to stderr after a completion
    pub fn usage_footer(&self, response: &CompletionResponse) {
        eprintln!(
            "{}",
            style(format!(
                "{} · {} · {} tokens ({} in / {} out) · ${:.6} · {}ms",
                response.provider_used,
                response.model_used,
                response.tokens.total,
                response.tokens.prompt,
                response.tokens.completion,
                response.estimated_cost_usd,
                response.latency_ms
            ))
            .dim()
        );
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
