pub mod error;
pub mod request;

pub use error::{
    AggregateFailure, ErrorCategory, ErrorClassifier, LlmError, ProviderFailure, Result,
    RouterError,
};
pub use request::{
    ChatMessage, CompletionRequest, CompletionResponse, ProviderId, ProviderOverride, Role,
    TokenUsage,
};
