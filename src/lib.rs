//! ai-router - Multi-Provider LLM Routing
//!
//! Routes completion requests across OpenAI, Anthropic and Gemini with
//! heuristic provider selection, ordered fallback, streaming and cost
//! accounting.
//!
//! ## Core Features
//!
//! - **Provider Adapters**: one `ProviderAdapter` per vendor over plain HTTP
//! - **Selection**: keyword and length heuristics; an explicit provider always wins
//! - **Fallback**: sequential, each configured provider tried at most once
//! - **Streaming**: incremental chunks from a single provider, no mid-stream fallback
//! - **Cost Accounting**: static per-model pricing applied to reported usage
//!
//! ## Quick Start
//!
//! ```ignore
//! use ai_router::{AiRouter, CompletionRequest, ConfigLoader};
//!
//! let config = ConfigLoader::load()?;
//! let router = AiRouter::from_config(&config)?;
//! let response = router
//!     .complete(&CompletionRequest::new("Analyze this contract for risks"))
//!     .await?;
//! println!("{} via {}", response.content, response.provider_used);
//! ```
//!
//! ## Modules
//!
//! - [`ai`]: adapters, selector, router, pricing and assistant helpers
//! - [`config`]: layered configuration and API key resolution
//! - [`types`]: request/response shapes and errors
//! - [`cli`]: command implementations for the `ai-router` binary

pub mod ai;
pub mod cli;
pub mod config;
pub mod constants;
pub mod types;

// Configuration
pub use config::{Config, ConfigLoader};

// Error Types
pub use types::error::{
    AggregateFailure, ErrorCategory, ErrorClassifier, LlmError, ProviderFailure, Result,
    RouterError,
};

// Request / Response
pub use types::request::{
    ChatMessage, CompletionRequest, CompletionResponse, ProviderId, ProviderOverride, Role,
    TokenUsage,
};

pub use ai::{
    // Helpers
    AiAssistant,
    // Routing
    AiRouter,
    AiRouterBuilder,
    ChunkStream,
    Extraction,
    // Metrics
    MetricsCollector,
    ModelPricing,
    ProviderAdapter,
    ProviderSelector,
    RouteReport,
    SharedMetrics,
    SharedRouter,
    // Timeout
    TimeoutConfig,
    estimate_cost,
    select_provider,
    with_timeout,
};
