//! AI Router
//!
//! Fallback and streaming orchestration over the provider adapters.
//!
//! ## Strategy
//!
//! 1. Validate the request and let the selector pick a provider
//! 2. Try the selected provider first, if it is configured
//! 3. On any failure, record it and walk the global priority list, skipping
//!    providers already attempted or without an API key
//! 4. Return the first success, or one aggregate error listing every failure
//!    in attempt order
//!
//! Attempts are strictly sequential and each provider is tried at most once
//! per request. Every call is bounded by the request timeout; a timeout counts
//! as an ordinary failure.
//!
//! Streaming resolves exactly one provider up front and never falls back: a
//! stream is either fully served by that provider or ends with its error.

use std::sync::Arc;
use std::time::Instant;

use async_stream::stream;
use futures::StreamExt;
use serde::Serialize;
use tracing::{Span, debug, info, instrument, warn};
use uuid::Uuid;

use super::metrics::SharedMetrics;
use super::provider::{ChunkStream, SharedAdapter, create_adapter};
use super::selector::ProviderSelector;
use super::timeout::{TimeoutConfig, with_timeout, with_timeout_map};
use crate::config::Config;
use crate::constants::{request as request_constants, routing};
use crate::types::{
    AggregateFailure, CompletionRequest, CompletionResponse, ErrorCategory, ErrorClassifier,
    ProviderFailure, ProviderId, Result, RouterError,
};

pub type SharedRouter = Arc<AiRouter>;

// =============================================================================
// Route Report
// =============================================================================

/// One provider attempt within a routed request
#[derive(Debug, Clone, Serialize)]
pub struct RouteAttempt {
    pub provider: ProviderId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// How a successful request was routed
#[derive(Debug, Clone, Serialize)]
pub struct RouteReport {
    pub request_id: Uuid,
    pub selected: ProviderId,
    pub attempts: Vec<RouteAttempt>,
    pub total_duration_ms: u64,
}

impl RouteReport {
    /// Provider that produced the response
    pub fn served_by(&self) -> Option<ProviderId> {
        self.attempts
            .iter()
            .find(|a| a.success)
            .map(|a| a.provider)
    }

    /// Whether a provider other than the selected one served the request
    pub fn fell_back(&self) -> bool {
        self.served_by().is_some_and(|p| p != self.selected)
    }
}

// =============================================================================
// Router
// =============================================================================

/// Request fields filled in when the caller leaves them unset
#[derive(Debug, Clone, Copy)]
struct RequestDefaults {
    max_tokens: u32,
    temperature: f32,
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            max_tokens: request_constants::DEFAULT_MAX_TOKENS,
            temperature: request_constants::DEFAULT_TEMPERATURE,
        }
    }
}

/// Routes completions across providers with fallback.
///
/// Built once at startup and shared; holds no mutable state, so concurrent
/// requests need no coordination.
pub struct AiRouter {
    adapters: Vec<SharedAdapter>,
    priority: Vec<ProviderId>,
    selector: ProviderSelector,
    timeouts: TimeoutConfig,
    defaults: RequestDefaults,
    metrics: Option<SharedMetrics>,
}

impl std::fmt::Debug for AiRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiRouter")
            .field(
                "adapters",
                &self.adapters.iter().map(|a| a.id()).collect::<Vec<_>>(),
            )
            .field("priority", &self.priority)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl AiRouter {
    pub fn builder() -> AiRouterBuilder {
        AiRouterBuilder::new()
    }

    /// Build from resolved configuration, one adapter per provider
    pub fn from_config(config: &Config) -> Result<Self> {
        let router = AiRouterBuilder::from_config(config)?.build();
        debug!(configured = ?router.configured_providers(), "Router built");
        Ok(router)
    }

    fn adapter(&self, provider: ProviderId) -> Option<&SharedAdapter> {
        self.adapters.iter().find(|a| a.id() == provider)
    }

    fn is_configured(&self, provider: ProviderId) -> bool {
        self.adapter(provider).is_some_and(|a| a.is_configured())
    }

    /// Configured providers in priority order
    pub fn configured_providers(&self) -> Vec<ProviderId> {
        self.priority
            .iter()
            .copied()
            .filter(|&p| self.is_configured(p))
            .collect()
    }

    pub fn priority(&self) -> &[ProviderId] {
        &self.priority
    }

    pub fn selector(&self) -> &ProviderSelector {
        &self.selector
    }

    pub fn metrics(&self) -> Option<&SharedMetrics> {
        self.metrics.as_ref()
    }

    /// Providers `complete` would try for `request`, in order, without calling any
    pub fn plan(&self, request: &CompletionRequest) -> Vec<ProviderId> {
        self.attempt_order(self.selector.select(request))
    }

    fn attempt_order(&self, selected: ProviderId) -> Vec<ProviderId> {
        let mut order = Vec::with_capacity(ProviderId::ALL.len());
        for provider in std::iter::once(selected).chain(self.priority.iter().copied()) {
            if !order.contains(&provider) && self.is_configured(provider) {
                order.push(provider);
            }
        }
        order
    }

    fn prepare(&self, request: &CompletionRequest) -> Result<CompletionRequest> {
        request.validate()?;
        let mut prepared = request.clone();
        prepared.max_tokens.get_or_insert(self.defaults.max_tokens);
        prepared.temperature.get_or_insert(self.defaults.temperature);
        Ok(prepared)
    }

    /// Complete with fallback, discarding the route report
    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        self.execute(request).await.map(|(response, _)| response)
    }

    /// Complete with fallback and report how the request was routed
    #[instrument(
        name = "route",
        skip(self, request),
        fields(request_id = tracing::field::Empty, selected = tracing::field::Empty)
    )]
    pub async fn execute(
        &self,
        request: &CompletionRequest,
    ) -> Result<(CompletionResponse, RouteReport)> {
        let request = self.prepare(request)?;
        let request_id = Uuid::new_v4();
        let start_time = Instant::now();
        let selected = self.selector.select(&request);

        let span = Span::current();
        span.record("request_id", tracing::field::display(request_id));
        span.record("selected", selected.as_str());

        if let Some(metrics) = &self.metrics {
            metrics.record_request();
        }

        let order = self.attempt_order(selected);
        debug!(?order, "Attempt order");

        let mut report = RouteReport {
            request_id,
            selected,
            attempts: Vec::with_capacity(order.len()),
            total_duration_ms: 0,
        };
        let mut failures: Vec<ProviderFailure> = Vec::new();

        for provider in order {
            let Some(adapter) = self.adapter(provider) else {
                continue;
            };
            let attempt_start = Instant::now();
            let operation = format!("{} completion", provider);

            match with_timeout(self.timeouts.request, adapter.complete(&request), &operation).await
            {
                Ok(response) => {
                    let duration_ms = attempt_start.elapsed().as_millis() as u64;
                    report.attempts.push(RouteAttempt {
                        provider,
                        success: true,
                        category: None,
                        error: None,
                        duration_ms,
                    });
                    report.total_duration_ms = start_time.elapsed().as_millis() as u64;

                    if let Some(metrics) = &self.metrics {
                        metrics.record_success(&response);
                    }

                    info!(
                        provider = %provider,
                        model = %response.model_used,
                        attempts = report.attempts.len(),
                        tokens = response.tokens.total,
                        cost_usd = response.estimated_cost_usd,
                        "Request routed"
                    );
                    return Ok((response, report));
                }
                Err(err) => {
                    let duration_ms = attempt_start.elapsed().as_millis() as u64;
                    let timed_out = matches!(err, RouterError::Timeout { .. });
                    let classified = ErrorClassifier::classify_router_error(&err, provider);

                    warn!(
                        provider = %provider,
                        category = %classified.category,
                        error = %classified.message,
                        "Provider failed, advancing chain"
                    );

                    if let Some(metrics) = &self.metrics {
                        metrics.record_failure(provider, classified.category, timed_out);
                    }

                    report.attempts.push(RouteAttempt {
                        provider,
                        success: false,
                        category: Some(classified.category),
                        error: Some(classified.message.clone()),
                        duration_ms,
                    });
                    failures.push(ProviderFailure::from(classified));
                }
            }
        }

        if let Some(metrics) = &self.metrics {
            metrics.record_exhausted();
        }

        let aggregate = AggregateFailure::new(failures);
        if aggregate.is_unconfigured() {
            warn!("No AI providers configured");
        } else {
            warn!(attempts = aggregate.failures.len(), "All AI providers failed");
        }
        Err(aggregate.into())
    }

    /// Provider that serves a stream: the selected one if configured,
    /// otherwise the first configured one in priority order
    pub fn stream_provider(&self, request: &CompletionRequest) -> Option<ProviderId> {
        self.attempt_order(self.selector.select(request))
            .first()
            .copied()
    }

    /// Stream a completion from a single provider.
    ///
    /// Lazy: nothing is sent until the first poll. Chunks arrive in provider
    /// order. A failure before or during streaming ends the sequence with one
    /// error item and no other provider is tried.
    pub fn stream(&self, request: &CompletionRequest) -> ChunkStream {
        let request_id = Uuid::new_v4();
        let timeouts = self.timeouts.clone();
        let metrics = self.metrics.clone();

        let resolved = self.prepare(request).and_then(|prepared| {
            let provider = self
                .stream_provider(&prepared)
                .ok_or_else(|| RouterError::from(AggregateFailure::no_providers()))?;
            let adapter = self
                .adapter(provider)
                .cloned()
                .ok_or(RouterError::NotConfigured(provider))?;
            Ok((adapter, prepared))
        });

        Box::pin(stream! {
            if let Some(metrics) = &metrics {
                metrics.record_request();
            }

            let (adapter, request) = match resolved {
                Ok(resolved) => resolved,
                Err(err) => {
                    warn!(request_id = %request_id, error = %err, "Stream not started");
                    yield Err(err);
                    return;
                }
            };
            let provider = adapter.id();
            info!(request_id = %request_id, provider = %provider, "Opening stream");

            let start_time = Instant::now();
            let operation = format!("{} stream open", provider);
            let mut chunks = match with_timeout(timeouts.request, adapter.stream(&request), &operation).await {
                Ok(chunks) => chunks,
                Err(err) => {
                    let classified = ErrorClassifier::classify_router_error(&err, provider);
                    warn!(
                        request_id = %request_id,
                        provider = %provider,
                        category = %classified.category,
                        error = %classified.message,
                        "Stream failed before first chunk"
                    );
                    if let Some(metrics) = &metrics {
                        metrics.record_failure(
                            provider,
                            classified.category,
                            matches!(err, RouterError::Timeout { .. }),
                        );
                    }
                    yield Err(err);
                    return;
                }
            };

            let operation = format!("{} next chunk", provider);
            let mut yielded = 0usize;
            loop {
                match with_timeout_map(timeouts.stream_idle, chunks.next(), &operation).await {
                    Ok(Some(Ok(text))) => {
                        yielded += 1;
                        yield Ok(text);
                    }
                    Ok(Some(Err(err))) | Err(err) => {
                        let classified = ErrorClassifier::classify_router_error(&err, provider);
                        warn!(
                            request_id = %request_id,
                            provider = %provider,
                            chunks = yielded,
                            error = %classified.message,
                            "Stream interrupted"
                        );
                        if let Some(metrics) = &metrics {
                            metrics.record_failure(
                                provider,
                                classified.category,
                                matches!(err, RouterError::Timeout { .. }),
                            );
                        }
                        yield Err(err);
                        return;
                    }
                    Ok(None) => break,
                }
            }
            if let Some(metrics) = &metrics {
                metrics.record_stream_success(provider, start_time.elapsed().as_millis() as u64);
            }
            debug!(request_id = %request_id, provider = %provider, chunks = yielded, "Stream complete");
        })
    }
}

// =============================================================================
// Builder
// =============================================================================

pub struct AiRouterBuilder {
    adapters: Vec<SharedAdapter>,
    priority: Vec<ProviderId>,
    selector: ProviderSelector,
    timeouts: TimeoutConfig,
    defaults: RequestDefaults,
    metrics: Option<SharedMetrics>,
}

impl Default for AiRouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AiRouterBuilder {
    /// Builder preloaded from validated configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let mut builder = Self::new()
            .priority(config.routing.priority.clone())
            .selector(ProviderSelector::new(config.routing.long_prompt_threshold))
            .timeouts(config.timeouts())
            .request_defaults(config.defaults.max_tokens, config.defaults.temperature);

        for provider_config in config.provider_configs() {
            builder = builder.adapter(create_adapter(provider_config)?);
        }
        Ok(builder)
    }

    pub fn new() -> Self {
        Self {
            adapters: Vec::new(),
            priority: routing::DEFAULT_PRIORITY.to_vec(),
            selector: ProviderSelector::default(),
            timeouts: TimeoutConfig::default(),
            defaults: RequestDefaults::default(),
            metrics: None,
        }
    }

    /// Register an adapter, replacing any earlier one for the same provider
    pub fn adapter(mut self, adapter: SharedAdapter) -> Self {
        self.adapters.retain(|a| a.id() != adapter.id());
        self.adapters.push(adapter);
        self
    }

    pub fn priority(mut self, priority: Vec<ProviderId>) -> Self {
        self.priority = priority;
        self
    }

    pub fn selector(mut self, selector: ProviderSelector) -> Self {
        self.selector = selector;
        self
    }

    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn request_defaults(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.defaults = RequestDefaults {
            max_tokens,
            temperature,
        };
        self
    }

    pub fn metrics(mut self, metrics: SharedMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self) -> AiRouter {
        AiRouter {
            adapters: self.adapters,
            priority: self.priority,
            selector: self.selector,
            timeouts: self.timeouts,
            defaults: self.defaults,
            metrics: self.metrics,
        }
    }
}
