//! Global Constants
//!
//! Centralized constants for routing, request defaults and networking.
//! All magic numbers should be defined here with documentation.

/// Provider selection constants
pub mod routing {
    use crate::types::ProviderId;

    /// Prompts longer than this (in characters) go to the analytical provider
    pub const LONG_PROMPT_THRESHOLD: usize = 10_000;

    /// Keywords that mark a prompt as analytical (checked first)
    pub const ANALYTICAL_KEYWORDS: &[&str] = &[
        "analyze", "analyse", "analysis", "reason", "explain", "code", "legal", "contract",
        "compliance",
    ];

    /// Keywords that mark a prompt as generative or structured output
    pub const GENERATIVE_KEYWORDS: &[&str] = &[
        "write",
        "create",
        "generate",
        "json",
        "summarize",
        "summarise",
        "draft",
    ];

    /// Provider preferred for analytical work and used as the default
    pub const ANALYTICAL_PROVIDER: ProviderId = ProviderId::Anthropic;

    /// Provider preferred for generative/structured work
    pub const GENERATIVE_PROVIDER: ProviderId = ProviderId::OpenAi;

    /// Global fallback order
    pub const DEFAULT_PRIORITY: [ProviderId; 3] =
        [ProviderId::Anthropic, ProviderId::OpenAi, ProviderId::Gemini];
}

/// Request defaults
pub mod request {
    /// Default completion token limit
    pub const DEFAULT_MAX_TOKENS: u32 = 2000;

    /// Default sampling temperature
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;

    /// Valid temperature range (inclusive)
    pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f32> = 0.0..=2.0;
}

/// Default models per provider
pub mod models {
    pub const OPENAI_DEFAULT: &str = "gpt-4o";
    pub const ANTHROPIC_DEFAULT: &str = "claude-3-5-sonnet-20241022";
    pub const GEMINI_DEFAULT: &str = "gemini-1.5-pro";

    /// Model name prefixes accepted as overrides for each provider
    pub const OPENAI_PREFIXES: &[&str] = &["gpt-", "o1", "o3", "o4", "chatgpt-"];
    pub const ANTHROPIC_PREFIXES: &[&str] = &["claude-"];
    pub const GEMINI_PREFIXES: &[&str] = &["gemini-"];
}

/// HTTP/Network constants
pub mod network {
    /// Default per-call timeout for a provider completion (seconds)
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Maximum gap between two streamed chunks (seconds)
    pub const STREAM_IDLE_TIMEOUT_SECS: u64 = 60;

    /// TCP connect timeout (seconds)
    pub const CONNECTION_TIMEOUT_SECS: u64 = 30;

    pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";
    pub const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com/v1";
    pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

    /// Anthropic API version header value
    pub const ANTHROPIC_VERSION: &str = "2023-06-01";
}

/// Environment variables holding vendor API keys
pub mod env {
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    pub const ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
    pub const GEMINI_API_KEY: &str = "GEMINI_API_KEY";
    pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

    /// Prefix for structured configuration overrides
    pub const CONFIG_PREFIX: &str = "AI_ROUTER_";
}
