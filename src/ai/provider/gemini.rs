//! Google Gemini provider
//!
//! Token usage comes from `usageMetadata` when the API reports it; without
//! it tokens and cost stay at zero.

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
    CompletionRequest, CompletionResponse, ErrorCategory, ProviderId, Result, Role, RouterError,
    TokenUsage,
};

const PROVIDER: ProviderId = ProviderId::Gemini;

pub struct GeminiProvider {
    api_key: Option<SecretString>,
    api_base: String,
    model: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(config: ProviderConfig) -> Result<Self> {
        let (api_key, model, api_base) = config.into_parts(net_constants::GEMINI_API_BASE);
        Ok(Self {
            api_key,
            api_base,
            model,
            client: build_http_client(PROVIDER)?,
        })
    }

    /// Convert provider-agnostic messages to Gemini wire format
    fn build_request(&self, request: &CompletionRequest) -> GenerateContentRequest {
        let contents = request
            .messages()
            .into_iter()
            .map(|m| GeminiContent {
                role: match m.role {
                    Role::User => "user".to_string(),
                    Role::Assistant => "model".to_string(),
                },
                parts: vec![GeminiPart { text: m.content }],
            })
            .collect();

        GenerateContentRequest {
            contents,
            system_instruction: request.system().map(|s| SystemInstruction {
                parts: vec![GeminiPart {
                    text: s.to_string(),
                }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: request.effective_max_tokens(),
                temperature: request.effective_temperature(),
            },
        }
    }

    async fn send(
        &self,
        model: &str,
        action: &str,
        body: &GenerateContentRequest,
    ) -> Result<reqwest::Response> {
        let api_key = require_key(PROVIDER, &self.api_key)?;
        let url = format!("{}/models/{}:{}", self.api_base, model, action);

        // Key goes in a header so it never appears in logged URLs
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER, e))?;

        check_status(PROVIDER, response).await
    }
}

#[async_trait]
impl ProviderAdapter for GeminiProvider {
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
        let model = self.model_for(request);
        let body = self.build_request(request);
        info!(model = %model, contents = body.contents.len(), "Generating with Gemini");

        let start_time = Instant::now();
        let response = self.send(&model, "generateContent", &body).await?;

        let response_body: GenerateContentResponse = response.json().await.map_err(|e| {
            RouterError::provider_with_category(
                PROVIDER,
                ErrorCategory::ParseError,
                format!("Failed to parse Gemini response: {}", e),
            )
        })?;

        let usage = response_body.usage();
        let content = response_body.first_candidate_text().ok_or_else(|| {
            RouterError::provider_with_category(
                PROVIDER,
                ErrorCategory::ParseError,
                "Gemini response had no candidates",
            )
        })?;

        debug!(tokens = usage.total, "Received response from Gemini");
        Ok(priced_response(
            PROVIDER,
            model,
            content,
            usage,
            start_time.elapsed(),
        ))
    }

    async fn stream(&self, request: &CompletionRequest) -> Result<ChunkStream> {
        let model = self.model_for(request);
        let body = self.build_request(request);
        info!(model = %model, "Streaming with Gemini");

        let response = self
            .send(&model, "streamGenerateContent?alt=sse", &body)
            .await?;
        Ok(sse::text_stream(PROVIDER, response, parse_stream_event))
    }
}

fn parse_stream_event(event: &SseEvent) -> Result<StreamDelta> {
    let data = event.data.trim();
    if data.is_empty() {
        return Ok(StreamDelta::Skip);
    }

    let chunk: GenerateContentResponse = serde_json::from_str(data).map_err(|e| {
        RouterError::provider_with_category(
            PROVIDER,
            ErrorCategory::ParseError,
            format!("Malformed Gemini stream chunk: {}", e),
        )
    })?;

    Ok(chunk
        .first_candidate_text()
        .map(StreamDelta::Text)
        .unwrap_or(StreamDelta::Skip))
}

// ── Gemini wire types ──

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: String,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    fn first_candidate_text(&self) -> Option<String> {
        self.candidates.first().map(|c| {
            c.content
                .as_ref()
                .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
                .unwrap_or_default()
        })
    }

    fn usage(&self) -> TokenUsage {
        self.usage_metadata
            .as_ref()
            .map(|u| {
                TokenUsage::new(
                    u.prompt_token_count.unwrap_or(0),
                    u.candidates_token_count.unwrap_or(0),
                )
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChatMessage;
    use futures::StreamExt;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> GeminiProvider {
        let config = ProviderConfig::new(PROVIDER, Some("g-key".to_string()))
            .with_api_base(server.uri());
        GeminiProvider::new(config).unwrap()
    }

    #[test]
    fn test_assistant_turns_map_to_model_role() {
        let provider =
            GeminiProvider::new(ProviderConfig::new(PROVIDER, Some("k".to_string()))).unwrap();
        let request = CompletionRequest::new("next")
            .with_system("sys")
            .with_history(vec![ChatMessage::user("q"), ChatMessage::assistant("a")]);

        let body = provider.build_request(&request);
        let roles: Vec<&str> = body.contents.iter().map(|c| c.role.as_str()).collect();
        assert_eq!(roles, vec!["user", "model", "user"]);

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "sys");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 2000);
    }

    #[tokio::test]
    async fn test_complete_without_usage_reports_zero_cost() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:generateContent"))
            .and(header("x-goog-api-key", "g-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"role": "model", "parts": [{"text": "Bonjour"}]}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server)
            .complete(&CompletionRequest::new("Say hi in French"))
            .await
            .unwrap();

        assert_eq!(response.content, "Bonjour");
        assert_eq!(response.tokens, TokenUsage::default());
        assert_eq!(response.estimated_cost_usd, 0.0);
    }

    #[tokio::test]
    async fn test_complete_with_usage_metadata_is_priced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "ok"}]}}],
                "usageMetadata": {"promptTokenCount": 1000, "candidatesTokenCount": 200}
            })))
            .mount(&server)
            .await;

        let response = provider(&server)
            .complete(&CompletionRequest::new("hi"))
            .await
            .unwrap();
        assert_eq!(response.tokens, TokenUsage::new(1000, 200));
        // 1000 * 1.25 + 200 * 5.0 per million
        assert!((response.estimated_cost_usd - 0.00225).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_stream_reads_sse_candidates() {
        let server = MockServer::start().await;
        let body = concat!(
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Once \"}]}}]}\r\n\r\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"upon\"}]}}]}\r\n\r\n",
        );
        Mock::given(method("POST"))
            .and(path("/models/gemini-1.5-pro:streamGenerateContent"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(body),
            )
            .mount(&server)
            .await;

        let stream = provider(&server)
            .stream(&CompletionRequest::new("tell a story"))
            .await
            .unwrap();
        let chunks: Vec<String> = stream.map(|c| c.unwrap()).collect().await;
        assert_eq!(chunks, vec!["Once ", "upon"]);
    }
}
