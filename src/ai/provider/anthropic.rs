//! Anthropic Messages API Provider

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, info};

use super::sse::{self, SseEvent, StreamDelta};
use super::{
    ChunkStream, ProviderAdapter, ProviderConfig, build_http_client, check_status,
    priced_response, require_key, transport_error,
};
use crate::constants::network as net_constants;
use crate::types::{
    CompletionRequest, CompletionResponse, ErrorCategory, ProviderId, Result, RouterError,
    TokenUsage,
};

const PROVIDER: ProviderId = ProviderId::Anthropic;

pub struct AnthropicProvider {
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let (api_key, model, api_base) = config.into_parts(net_constants::ANTHROPIC_API_BASE);
        Ok(Self {
            api_key,
            api_base,
            model,
            client: build_http_client(PROVIDER)?,
        })
    }

    fn build_request(&self, request: &CompletionRequest, stream: bool) -> MessagesRequest {
        // System prompt travels as a top-level field, not a message
        MessagesRequest {
            model: self.model_for(request),
            max_tokens: request.effective_max_tokens(),
            temperature: request.effective_temperature(),
            system: request.system().map(String::from),
            messages: request
                .messages()
                .into_iter()
                .map(|m| WireMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content,
                })
                .collect(),
            stream,
        }
    }

    async fn send(&self, body: &MessagesRequest) -> Result<reqwest::Response> {
        let api_key = require_key(PROVIDER, &self.api_key)?;
        let url = format!("{}/messages", self.api_base);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", api_key)
            .header("anthropic-version", net_constants::ANTHROPIC_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        check_status(PROVIDER, response).await
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    fn id(&self) -> ProviderId {
        PROVIDER
    }

    fn default_model(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
        let body = self.build_request(request, false);
        info!(model = %body.model, messages = body.messages.len(), "Generating with Anthropic");

        let start_time = Instant::now();
        let response = self.send(&body).await?;

        let response_body: MessagesResponse = response.json().await.map_err(|e| {
            RouterError::provider_with_category(
                PROVIDER,
                ErrorCategory::ParseError,
                format!("Failed to parse Anthropic response: {}", e),
            )
        })?;

        if response_body.content.is_empty() {
            return Err(RouterError::provider_with_category(
                PROVIDER,
                ErrorCategory::ParseError,
                "No content in Anthropic response",
            ));
        }

        let content: String = response_body
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect();

        let usage = response_body
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        debug!(tokens = usage.total, "Received response from Anthropic");
        Ok(priced_response(
            PROVIDER,
            body.model,
            content,
            usage,
            start_time.elapsed(),
        ))
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<ChunkStream> {
        let body = self.build_request(request, true);
        info!(model = %body.model, "Streaming with Anthropic");

        let response = self.send(&body).await?;
        Ok(sse::text_stream(PROVIDER, response, parse_stream_event))
    }
}

fn parse_stream_event(event: &SseEvent) -> Result<StreamDelta> {
    let data = event.data.trim();
    if data.is_empty() {
        return Ok(StreamDelta::Skip);
    }

    let payload: StreamEvent = serde_json::from_str(data).map_err(|e| {
        RouterError::provider_with_category(
            PROVIDER,
            ErrorCategory::ParseError,
            format!("Malformed Anthropic stream event: {}", e),
        )
    })?;

    match payload.event_type.as_str() {
        "content_block_delta" => Ok(payload
            .delta
            .filter(|d| d.delta_type.as_deref() == Some("text_delta"))
            .and_then(|d| d.text)
            .map(StreamDelta::Text)
            .unwrap_or(StreamDelta::Skip)),
        "message_stop" => Ok(StreamDelta::Done),
        "error" => {
            let message = payload
                .error
                .map(|e| format!("{}: {}", e.error_type, e.message))
                .unwrap_or_else(|| "unknown stream error".to_string());
            Err(RouterError::provider(PROVIDER, message))
        }
        _ => Ok(StreamDelta::Skip),
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    event_type: String,
    delta: Option<StreamDeltaBody>,
    error: Option<StreamErrorBody>,
}

#[derive(Debug, Deserialize)]
struct StreamDeltaBody {
    #[serde(rename = "type")]
    delta_type: Option<String>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamErrorBody {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> AnthropicProvider {
        let config = ProviderConfig::new(PROVIDER, Some("ant-key".to_string()))
            .with_api_base(format!("{}/v1", server.uri()));
        AnthropicProvider::new(config).unwrap()
    }

    #[test]
    fn test_system_prompt_is_top_level() {
        let provider =
            AnthropicProvider::new(ProviderConfig::new(PROVIDER, Some("k".to_string()))).unwrap();
        let request = CompletionRequest::new("hello").with_system("You are terse");
        let body = provider.build_request(&request, false);

        assert_eq!(body.system.as_deref(), Some("You are terse"));
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
    }

    #[tokio::test]
    async fn test_complete_prices_known_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "ant-key"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(json!({"model": "claude-3-5-sonnet-20241022"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    {"type": "text", "text": "Risk: "},
                    {"type": "text", "text": "indemnity clause"}
                ],
                "usage": {"input_tokens": 100, "output_tokens": 50}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server)
            .complete(&CompletionRequest::new("Analyze this contract"))
            .await
            .unwrap();

        assert_eq!(response.content, "Risk: indemnity clause");
        assert_eq!(response.provider_used, ProviderId::Anthropic);
        assert_eq!(response.tokens, TokenUsage::new(100, 50));
        assert_eq!(response.estimated_cost_usd, 0.00105);
    }

    #[tokio::test]
    async fn test_stream_text_deltas_until_message_stop() {
        let server = MockServer::start().await;
        let body = concat!(
            "event: message_start\ndata: {\"type\":\"message_start\",\"message\":{}}\n\n",
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\"Hi\"}}\n\n",
            "event: ping\ndata: {\"type\":\"ping\"}\n\n",
            "event: content_block_delta\ndata: {\"type\":\"content_block_delta\",\"index\":0,\"delta\":{\"type\":\"text_delta\",\"text\":\" there\"}}\n\n",
            "event: message_stop\ndata: {\"type\":\"message_stop\"}\n\n",
        );
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let stream = provider(&server)
            .stream(&CompletionRequest::new("hi"))
            .await
            .unwrap();
        let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks, vec!["Hi", " there"]);
    }

    #[test]
    fn test_stream_error_event_becomes_error() {
        let event = SseEvent {
            event: Some("error".to_string()),
            data: r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#
                .to_string(),
        };
        let err = parse_stream_event(&event).unwrap_err();
        assert!(err.to_string().contains("Overloaded"));
    }
}
