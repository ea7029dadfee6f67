//! Routing Metrics Collection
//!
//! Per-provider counters for successes, failures, tokens, latency and cost.
//! Lock-free; one collector may be shared by every router in a process.
//!
//! ## Usage
//!
//! ```ignore
//! let metrics = create_shared_metrics("session-123");
//! let router = AiRouter::builder().metrics(metrics.clone()).build();
//! router.complete(&request).await?;
//! println!("{}", metrics.summary().display());
//! ```

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

use crate::types::{CompletionResponse, ErrorCategory, ProviderId};

pub type SharedMetrics = Arc<MetricsCollector>;

const NANOS_PER_USD: f64 = 1_000_000_000.0;

fn usd_to_nanos(usd: f64) -> u64 {
    (usd.max(0.0) * NANOS_PER_USD).round() as u64
}

pub fn create_shared_metrics(session_id: impl Into<String>) -> SharedMetrics {
    Arc::new(MetricsCollector::new(session_id))
}

#[derive(Debug, Default)]
struct ProviderCounters {
    successes: AtomicU32,
    failures: AtomicU32,
    timeouts: AtomicU32,
    prompt_tokens: AtomicU64,
    completion_tokens: AtomicU64,
    latency_ms: AtomicU64,
    /// Nanodollars, so single-token calls on the cheapest models still register
    cost_nanos: AtomicU64,
}

/// Thread-safe metrics collector for routed completions.
#[derive(Debug)]
pub struct MetricsCollector {
    session_id: String,
    start_time: Instant,
    requests: AtomicU32,
    exhausted: AtomicU32,
    providers: [ProviderCounters; 3],
}

/// Totals for one provider
#[derive(Debug, Clone, Serialize)]
pub struct ProviderMetrics {
    pub provider: ProviderId,
    pub successes: u32,
    pub failures: u32,
    pub timeouts: u32,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub avg_latency_ms: f64,
    pub cost_usd: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub session_id: String,
    pub total_duration_ms: u64,
    pub requests: u32,
    /// Requests where every attempted provider failed
    pub exhausted: u32,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
    pub providers: Vec<ProviderMetrics>,
}

impl MetricsCollector {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            start_time: Instant::now(),
            requests: AtomicU32::new(0),
            exhausted: AtomicU32::new(0),
            providers: Default::default(),
        }
    }

    fn counters(&self, provider: ProviderId) -> &ProviderCounters {
        &self.providers[provider.index()]
    }

    /// Count one routed request, whatever its outcome
    pub fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self, response: &CompletionResponse) {
        let counters = self.counters(response.provider_used);
        counters.successes.fetch_add(1, Ordering::Relaxed);
        counters
            .prompt_tokens
            .fetch_add(response.tokens.prompt as u64, Ordering::Relaxed);
        counters
            .completion_tokens
            .fetch_add(response.tokens.completion as u64, Ordering::Relaxed);
        counters
            .latency_ms
            .fetch_add(response.latency_ms, Ordering::Relaxed);

        counters
            .cost_nanos
            .fetch_add(usd_to_nanos(response.estimated_cost_usd), Ordering::Relaxed);
    }

    /// A stream that ran to completion. Streams carry no usage, only latency.
    pub fn record_stream_success(&self, provider: ProviderId, latency_ms: u64) {
        let counters = self.counters(provider);
        counters.successes.fetch_add(1, Ordering::Relaxed);
        counters.latency_ms.fetch_add(latency_ms, Ordering::Relaxed);
    }

    pub fn record_failure(&self, provider: ProviderId, category: ErrorCategory, timed_out: bool) {
        let counters = self.counters(provider);
        counters.failures.fetch_add(1, Ordering::Relaxed);
        if timed_out {
            counters.timeouts.fetch_add(1, Ordering::Relaxed);
        }
        tracing::trace!(provider = %provider, category = %category, "Recorded provider failure");
    }

    pub fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSummary {
        let providers: Vec<ProviderMetrics> = ProviderId::ALL
            .iter()
            .map(|&provider| {
                let c = self.counters(provider);
                let successes = c.successes.load(Ordering::Relaxed);
                let latency = c.latency_ms.load(Ordering::Relaxed);
                ProviderMetrics {
                    provider,
                    successes,
                    failures: c.failures.load(Ordering::Relaxed),
                    timeouts: c.timeouts.load(Ordering::Relaxed),
                    prompt_tokens: c.prompt_tokens.load(Ordering::Relaxed),
                    completion_tokens: c.completion_tokens.load(Ordering::Relaxed),
                    avg_latency_ms: if successes > 0 {
                        latency as f64 / successes as f64
                    } else {
                        0.0
                    },
                    cost_usd: c.cost_nanos.load(Ordering::Relaxed) as f64 / NANOS_PER_USD,
                }
            })
            .collect();

        MetricsSummary {
            session_id: self.session_id.clone(),
            total_duration_ms: self.start_time.elapsed().as_millis() as u64,
            requests: self.requests.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            total_tokens: providers
                .iter()
                .map(|p| p.prompt_tokens + p.completion_tokens)
                .sum(),
            total_cost_usd: providers.iter().map(|p| p.cost_usd).sum(),
            providers,
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        self.snapshot()
    }
}

impl MetricsSummary {
    /// Format summary for display
    pub fn display(&self) -> String {
        let mut out = format!(
            "Session: {}\n\
             Duration: {:.1}s\n\
             Requests: {} ({} exhausted)\n\
             Tokens: {}\n\
             Estimated Cost: ${:.4}",
            self.session_id,
            self.total_duration_ms as f64 / 1000.0,
            self.requests,
            self.exhausted,
            self.total_tokens,
            self.total_cost_usd
        );
        for p in self.providers.iter().filter(|p| p.successes + p.failures > 0) {
            out.push_str(&format!(
                "\n  {}: {} ok, {} failed, avg {:.0}ms, ${:.4}",
                p.provider, p.successes, p.failures, p.avg_latency_ms, p.cost_usd
            ));
        }
        out
    }

    pub fn provider(&self, provider: ProviderId) -> Option<&ProviderMetrics> {
        self.providers.iter().find(|p| p.provider == provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TokenUsage;

    fn response(provider: ProviderId, cost: f64) -> CompletionResponse {
        CompletionResponse {
            content: "ok".to_string(),
            provider_used: provider,
            model_used: "m".to_string(),
            tokens: TokenUsage::new(100, 50),
            estimated_cost_usd: cost,
            latency_ms: 40,
        }
    }

    #[test]
    fn test_metrics_collector_basic() {
        let metrics = MetricsCollector::new("test-session");
        metrics.record_request();
        metrics.record_success(&response(ProviderId::Anthropic, 0.00105));

        let summary = metrics.summary();
        assert_eq!(summary.session_id, "test-session");
        assert_eq!(summary.requests, 1);
        assert_eq!(summary.total_tokens, 150);
        assert!((summary.total_cost_usd - 0.00105).abs() < 1e-9);

        let anthropic = summary.provider(ProviderId::Anthropic).unwrap();
        assert_eq!(anthropic.successes, 1);
        assert_eq!(anthropic.avg_latency_ms, 40.0);
    }

    #[test]
    fn test_failures_tracked_per_provider() {
        let metrics = MetricsCollector::new("s");
        metrics.record_failure(ProviderId::OpenAi, ErrorCategory::Network, true);
        metrics.record_failure(ProviderId::OpenAi, ErrorCategory::Auth, false);
        metrics.record_exhausted();

        let summary = metrics.snapshot();
        let openai = summary.provider(ProviderId::OpenAi).unwrap();
        assert_eq!(openai.failures, 2);
        assert_eq!(openai.timeouts, 1);
        assert_eq!(summary.exhausted, 1);
        assert_eq!(summary.provider(ProviderId::Gemini).unwrap().failures, 0);
    }

    #[test]
    fn test_sub_microdollar_costs_accumulate() {
        // one prompt token on gemini-1.5-flash
        let tiny = 0.075 / 1_000_000.0;
        let metrics = MetricsCollector::new("s");
        for _ in 0..1000 {
            metrics.record_success(&response(ProviderId::Gemini, tiny));
        }

        let cost = metrics.summary().provider(ProviderId::Gemini).unwrap().cost_usd;
        assert!(cost > 0.0);
        assert!((cost - 0.000075).abs() < 1e-9);
    }

    #[test]
    fn test_display_lists_only_active_providers() {
        let metrics = MetricsCollector::new("s");
        metrics.record_success(&response(ProviderId::Gemini, 0.0));
        let text = metrics.summary().display();
        assert!(text.contains("gemini: 1 ok"));
        assert!(!text.contains("openai"));
    }
}
