//! Call Deadlines
//!
//! A hung provider must not stall the fallback chain, so the router bounds
//! every adapter call. Completions and stream opens share the request
//! deadline; an open stream is bounded per chunk by the idle deadline.
//!
//! Expiry surfaces as `RouterError::Timeout`, which the router records as a
//! `Network` failure before moving to the next provider.

use std::future::Future;
use std::time::Duration;

use crate::constants::network as net_constants;
use crate::types::{Result, RouterError};

#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// One completion call, or opening a stream (default: 2 minutes)
    pub request: Duration,
    /// Longest gap between two streamed chunks (default: 60 seconds)
    pub stream_idle: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request: Duration::from_secs(net_constants::DEFAULT_TIMEOUT_SECS),
            stream_idle: Duration::from_secs(net_constants::STREAM_IDLE_TIMEOUT_SECS),
        }
    }
}

impl TimeoutConfig {
    pub fn new(request: Duration, stream_idle: Duration) -> Self {
        Self {
            request,
            stream_idle,
        }
    }
}

/// Await a fallible provider call, failing with `RouterError::Timeout` after `timeout`
pub async fn with_timeout<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => result,
        Err(_) => Err(RouterError::timeout(operation_name, timeout)),
    }
}

/// Like [`with_timeout`] for futures whose output is not a `Result`,
/// such as `StreamExt::next` on a chunk stream
pub async fn with_timeout_map<T, F>(timeout: Duration, future: F, operation_name: &str) -> Result<T>
where
    F: Future<Output = T>,
{
    match tokio::time::timeout(timeout, future).await {
        Ok(result) => Ok(result),
        Err(_) => Err(RouterError::timeout(operation_name, timeout)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_network_constants() {
        let deadlines = TimeoutConfig::default();
        assert_eq!(deadlines.request, Duration::from_secs(120));
        assert_eq!(deadlines.stream_idle, Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_provider_error_passes_through_unchanged() {
        let result: Result<u32> = with_timeout(
            Duration::from_secs(1),
            async { Err(RouterError::InvalidRequest("empty prompt".to_string())) },
            "openai completion",
        )
        .await;
        assert!(matches!(result, Err(RouterError::InvalidRequest(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_call_becomes_named_timeout() {
        let result: Result<u32> = with_timeout(
            Duration::from_secs(5),
            std::future::pending(),
            "anthropic completion",
        )
        .await;

        match result {
            Err(RouterError::Timeout {
                operation,
                duration,
            }) => {
                assert_eq!(operation, "anthropic completion");
                assert_eq!(duration, Duration::from_secs(5));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_chunk_wait_times_out() {
        let next_chunk = with_timeout_map(
            Duration::from_secs(60),
            std::future::pending::<Option<String>>(),
            "gemini next chunk",
        )
        .await;
        assert!(matches!(next_chunk, Err(RouterError::Timeout { .. })));

        let ready = with_timeout_map(Duration::from_secs(1), async { Some("text") }, "next").await;
        assert_eq!(ready.unwrap(), Some("text"));
    }
}
