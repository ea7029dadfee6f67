//! Unified Error Type System
//!
//! Centralized error types for the router and its adapters.
//!
//! ## Error Categories
//!
//! Every provider failure is classified for logging and attempt reports.
//! Categories never trigger a retry against the same provider: any failure
//! simply advances the fallback chain.
//!
//! - **RateLimit**: API rate limiting
//! - **TokenLimit**: Context too large
//! - **Auth**: Authentication failures
//! - **Network**: Connectivity issues and timeouts
//! - **Unavailable**: Provider unavailable or model not found
//! - **BadRequest**: Request rejected by the provider
//! - **ParseError**: Malformed provider response
//! - **Transient**: Server-side errors

use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use super::request::ProviderId;

// =============================================================================
// Error Categories
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCategory {
    RateLimit,
    TokenLimit,
    Auth,
    Network,
    Unavailable,
    BadRequest,
    ParseError,
    Transient,
    Unknown,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimit => write!(f, "RATE_LIMIT"),
            Self::TokenLimit => write!(f, "TOKEN_LIMIT"),
            Self::Auth => write!(f, "AUTH"),
            Self::Network => write!(f, "NETWORK"),
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::BadRequest => write!(f, "BAD_REQUEST"),
            Self::ParseError => write!(f, "PARSE_ERROR"),
            Self::Transient => write!(f, "TRANSIENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// =============================================================================
// LLM Error
// =============================================================================

/// A single provider call failure with its category
#[derive(Debug, Clone)]
pub struct LlmError {
    pub category: ErrorCategory,
    pub message: String,
    pub provider: ProviderId,
}

impl fmt::Display for LlmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}] {}", self.provider, self.category, self.message)
    }
}

impl std::error::Error for LlmError {}

impl LlmError {
    pub fn new(category: ErrorCategory, message: impl Into<String>, provider: ProviderId) -> Self {
        Self {
            category,
            message: message.into(),
            provider,
        }
    }
}

// =============================================================================
// Error Classifier
// =============================================================================

pub struct ErrorClassifier;

impl ErrorClassifier {
    /// Classify an error message from any provider
    pub fn classify(message: &str, provider: ProviderId) -> LlmError {
        let lower = message.to_lowercase();

        let category = if lower.contains("rate limit")
            || lower.contains("429")
            || lower.contains("too many requests")
            || lower.contains("quota exceeded")
        {
            ErrorCategory::RateLimit
        } else if lower.contains("token")
            && (lower.contains("limit") || lower.contains("exceed") || lower.contains("maximum"))
            || lower.contains("context length")
            || lower.contains("too large")
        {
            ErrorCategory::TokenLimit
        } else if lower.contains("auth")
            || lower.contains("401")
            || lower.contains("403")
            || lower.contains("api key")
            || lower.contains("unauthorized")
            || lower.contains("permission denied")
        {
            ErrorCategory::Auth
        } else if lower.contains("network")
            || lower.contains("connection")
            || lower.contains("dns")
            || lower.contains("timeout")
            || lower.contains("timed out")
            || lower.contains("unreachable")
        {
            ErrorCategory::Network
        } else if lower.contains("503")
            || lower.contains("502")
            || lower.contains("service unavailable")
            || lower.contains("not found")
        {
            ErrorCategory::Unavailable
        } else if lower.contains("400") || lower.contains("bad request") || lower.contains("invalid")
        {
            ErrorCategory::BadRequest
        } else if lower.contains("parse")
            || lower.contains("json")
            || lower.contains("malformed")
            || lower.contains("no content")
        {
            ErrorCategory::ParseError
        } else if lower.contains("500")
            || lower.contains("server error")
            || lower.contains("overloaded")
            || lower.contains("temporary")
        {
            ErrorCategory::Transient
        } else {
            ErrorCategory::Unknown
        };

        LlmError::new(category, message, provider)
    }

    /// Classify HTTP status code directly (more accurate than string matching)
    pub fn classify_http_status(status: u16, message: &str, provider: ProviderId) -> LlmError {
        let category = match status {
            429 => ErrorCategory::RateLimit,
            401 | 403 => ErrorCategory::Auth,
            400 | 422 => ErrorCategory::BadRequest,
            413 => ErrorCategory::TokenLimit,
            404 => ErrorCategory::Unavailable,
            500 | 502 | 503 | 504 | 529 => ErrorCategory::Transient,
            _ => ErrorCategory::Unknown,
        };
        LlmError::new(category, message, provider)
    }

    /// Classify a router error raised while calling `provider`
    pub fn classify_router_error(err: &RouterError, provider: ProviderId) -> LlmError {
        match err {
            RouterError::Llm(llm) => llm.clone(),
            RouterError::Timeout { .. } => {
                LlmError::new(ErrorCategory::Network, err.to_string(), provider)
            }
            RouterError::NotConfigured(_) | RouterError::Config(_) => {
                LlmError::new(ErrorCategory::Auth, err.to_string(), provider)
            }
            RouterError::Json(_) => {
                LlmError::new(ErrorCategory::ParseError, err.to_string(), provider)
            }
            RouterError::InvalidRequest(_) => {
                LlmError::new(ErrorCategory::BadRequest, err.to_string(), provider)
            }
            _ => Self::classify(&err.to_string(), provider),
        }
    }
}

// =============================================================================
// Aggregate Failure
// =============================================================================

/// One failed provider attempt
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub provider: ProviderId,
    pub category: ErrorCategory,
    pub message: String,
}

impl From<LlmError> for ProviderFailure {
    fn from(err: LlmError) -> Self {
        Self {
            provider: err.provider,
            category: err.category,
            message: err.message,
        }
    }
}

impl fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.provider, self.message)
    }
}

/// Every attempted provider failed, in attempt order.
///
/// An empty list means no provider was configured at all.
#[derive(Debug, Clone, Default)]
pub struct AggregateFailure {
    pub failures: Vec<ProviderFailure>,
}

impl AggregateFailure {
    pub fn new(failures: Vec<ProviderFailure>) -> Self {
        Self { failures }
    }

    pub fn no_providers() -> Self {
        Self::default()
    }

    pub fn is_unconfigured(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for AggregateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return write!(
                f,
                "no AI providers are configured (set ANTHROPIC_API_KEY, OPENAI_API_KEY or GEMINI_API_KEY)"
            );
        }
        write!(f, "all AI providers failed:")?;
        for failure in &self.failures {
            write!(f, "\n{}", failure)?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregateFailure {}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum RouterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Structured provider failure
    #[error("{0}")]
    Llm(LlmError),

    #[error("{0}")]
    AllProvidersFailed(AggregateFailure),

    #[error("provider {0} is not configured (missing API key)")]
    NotConfigured(ProviderId),

    #[error("Timeout after {duration:?}: {operation}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<LlmError> for RouterError {
    fn from(err: LlmError) -> Self {
        RouterError::Llm(err)
    }
}

impl From<AggregateFailure> for RouterError {
    fn from(err: AggregateFailure) -> Self {
        RouterError::AllProvidersFailed(err)
    }
}

pub type Result<T> = std::result::Result<T, RouterError>;

impl RouterError {
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Provider failure classified from its message
    pub fn provider(provider: ProviderId, message: impl Into<String>) -> Self {
        let message = message.into();
        Self::Llm(ErrorClassifier::classify(&message, provider))
    }

    /// Provider failure with an explicit category
    pub fn provider_with_category(
        provider: ProviderId,
        category: ErrorCategory,
        message: impl Into<String>,
    ) -> Self {
        Self::Llm(LlmError::new(category, message, provider))
    }
}
