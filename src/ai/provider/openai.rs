//! OpenAI API Provider
//!
//! Adapter over OpenAI's Chat Completions API, including the SSE streaming
//! variant.

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

const PROVIDER: ProviderId = ProviderId::OpenAi;

/// OpenAI API Provider with secure API key handling
pub struct OpenAiProvider {
    /// API key stored securely - never exposed in logs or debug output
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let (api_key, model, api_base) = config.into_parts(net_constants::OPENAI_API_BASE);
        Ok(Self {
            api_key,
            api_base,
            model,
            client: build_http_client(PROVIDER)?,
        })
    }

    fn build_request(&self, request: &CompletionRequest, stream: bool) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(request.history.len() + 2);
        if let Some(system) = request.system() {
            messages.push(WireMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.extend(request.messages().into_iter().map(|m| WireMessage {
            role: m.role.as_str().to_string(),
            content: m.content,
        }));

        ChatCompletionRequest {
            model: self.model_for(request),
            messages,
            max_tokens: request.effective_max_tokens(),
            temperature: request.effective_temperature(),
            stream,
        }
    }

    async fn send(&self, body: &ChatCompletionRequest) -> Result<reqwest::Response> {
        let api_key = require_key(PROVIDER, &self.api_key)?;
        let url = format!("{}/chat/completions", self.api_base);

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        check_status(PROVIDER, response).await
    }
}

#[async_trait]
impl ProviderAdapter for OpenAiProvider {
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
        info!(model = %body.model, messages = body.messages.len(), "Generating with OpenAI");

        let start_time = Instant::now();
        let response = self.send(&body).await?;

        let response_body: ChatCompletionResponse = response.json().await.map_err(|e| {
            RouterError::provider_with_category(
                PROVIDER,
                ErrorCategory::ParseError,
                format!("Failed to parse OpenAI response: {}", e),
            )
        })?;

        let usage = response_body
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let content = response_body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                RouterError::provider_with_category(
                    PROVIDER,
                    ErrorCategory::ParseError,
                    "No content in OpenAI response",
                )
            })?;

        debug!(tokens = usage.total, "Received response from OpenAI");
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
        info!(model = %body.model, "Streaming with OpenAI");

        let response = self.send(&body).await?;
        Ok(sse::text_stream(PROVIDER, response, parse_stream_event))
    }
}

fn parse_stream_event(event: &SseEvent) -> Result<StreamDelta> {
    let data = event.data.trim();
    if data == "[DONE]" {
        return Ok(StreamDelta::Done);
    }
    if data.is_empty() {
        return Ok(StreamDelta::Skip);
    }

    let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
        RouterError::provider_with_category(
            PROVIDER,
            ErrorCategory::ParseError,
            format!("Malformed OpenAI stream chunk: {}", e),
        )
    })?;

    if let Some(error) = chunk.error {
        return Err(RouterError::provider(PROVIDER, error.message));
    }

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .map(StreamDelta::Text)
        .unwrap_or(StreamDelta::Skip))
}

// Request/Response types

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    usage: Option<UsageInfo>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageInfo {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<StreamError>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDeltaBody,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDeltaBody {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamError {
    message: String,
}
