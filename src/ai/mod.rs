//! AI Integration Layer
//!
//! Provider adapters, selection heuristics, cost accounting and the
//! fallback router, plus assistant helpers built on top of them.

pub mod assist;
pub mod metrics;
pub mod pricing;
pub mod prompt;
pub mod provider;
pub mod router;
pub mod selector;
pub mod structured;
pub mod timeout;

pub use assist::{AiAssistant, ContractAnalysis, LeadSuggestion, RiskLevel};
pub use metrics::{
    MetricsCollector, MetricsSummary, ProviderMetrics, SharedMetrics, create_shared_metrics,
};
pub use pricing::{ModelPricing, estimate_cost};
pub use prompt::{PromptBuilder, PromptSection, PromptTemplates};
pub use provider::{
    AnthropicProvider, ChunkStream, GeminiProvider, OpenAiProvider, ProviderAdapter,
    ProviderConfig, SharedAdapter, create_adapter,
};
pub use router::{AiRouter, AiRouterBuilder, RouteAttempt, RouteReport, SharedRouter};
pub use selector::{ProviderSelector, select_provider};
pub use structured::{Extraction, FromRawFallback, extract_structured};
pub use timeout::{TimeoutConfig, with_timeout, with_timeout_map};
