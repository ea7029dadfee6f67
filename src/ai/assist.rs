//! Assistant helpers
//!
//! Business-facing operations on top of the router: chat, contract drafting,
//! contract analysis and lead generation. Structured helpers ask for JSON and
//! degrade to [`Extraction::FallbackRaw`] instead of failing on bad output;
//! only a total routing failure is an error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use super::prompt::PromptTemplates;
use super::router::SharedRouter;
use super::structured::{Extraction, FromRawFallback, extract_structured};
use crate::types::{ChatMessage, CompletionRequest, CompletionResponse, Result};

const STRUCTURED_TEMPERATURE: f32 = 0.2;
const DRAFTING_TEMPERATURE: f32 = 0.4;
const DRAFTING_MAX_TOKENS: u32 = 4000;
const LEAD_SCORE_MAX: u8 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractAnalysis {
    pub summary: String,
    pub key_terms: Vec<String>,
    pub risks: Vec<String>,
    pub risk_level: RiskLevel,
    pub recommendations: Vec<String>,
}

impl FromRawFallback for ContractAnalysis {
    fn from_raw(raw: String) -> Self {
        Self {
            summary: raw,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeadSuggestion {
    pub company: String,
    pub industry: String,
    pub contact_role: String,
    pub reason: String,
    /// Fit from 0 to 100
    #[serde(deserialize_with = "lenient_score")]
    pub score: u8,
}

/// Fractions round, out-of-range values clamp, numeric strings parse,
/// anything else is 0
fn lenient_score<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let clamp = |n: f64| n.round().clamp(0.0, f64::from(LEAD_SCORE_MAX)) as u8;
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64().map(clamp).unwrap_or(0),
        Value::String(s) => s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map(clamp)
            .unwrap_or(0),
        _ => 0,
    })
}

impl FromRawFallback for LeadSuggestion {
    fn from_raw(raw: String) -> Self {
        Self {
            reason: raw,
            ..Default::default()
        }
    }
}

/// Business helpers sharing one router
#[derive(Debug, Clone)]
pub struct AiAssistant {
    router: SharedRouter,
}

impl AiAssistant {
    pub fn new(router: SharedRouter) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &SharedRouter {
        &self.router
    }

    /// Answer `message` given the prior conversation, in order
    pub async fn chat(&self, history: &[ChatMessage], message: &str) -> Result<CompletionResponse> {
        let request = CompletionRequest::new(message)
            .with_system(PromptTemplates::chat_system())
            .with_history(history.to_vec());
        self.router.complete(&request).await
    }

    /// Plain-text contract draft from a free-form brief
    pub async fn draft_contract(&self, brief: &str) -> Result<CompletionResponse> {
        let request = CompletionRequest::new(PromptTemplates::contract_drafting(brief).build())
            .with_temperature(DRAFTING_TEMPERATURE)
            .with_max_tokens(DRAFTING_MAX_TOKENS);
        self.router.complete(&request).await
    }

    pub async fn analyze_contract(&self, contract: &str) -> Result<Extraction<ContractAnalysis>> {
        let request = CompletionRequest::new(PromptTemplates::contract_analysis(contract).build())
            .with_temperature(STRUCTURED_TEMPERATURE);
        let response = self.router.complete(&request).await?;
        debug!(provider = %response.provider_used, "Contract analysis received");
        Ok(extract_structured(&response.content))
    }

    pub async fn generate_leads(
        &self,
        criteria: &str,
        count: usize,
    ) -> Result<Extraction<Vec<LeadSuggestion>>> {
        let request =
            CompletionRequest::new(PromptTemplates::lead_generation(criteria, count).build())
                .with_temperature(STRUCTURED_TEMPERATURE);
        let response = self.router.complete(&request).await?;
        debug!(provider = %response.provider_used, "Lead suggestions received");
        Ok(extract_structured(&response.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{ChunkStream, ProviderAdapter};
    use crate::ai::router::AiRouter;
    use crate::types::{ProviderId, RouterError, TokenUsage};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    /// Replies with fixed text and keeps the last request
    struct CannedAdapter {
        reply: Option<&'static str>,
        last_request: Mutex<Option<CompletionRequest>>,
    }

    impl CannedAdapter {
        fn new(reply: Option<&'static str>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                last_request: Mutex::new(None),
            })
        }

        fn last_request(&self) -> CompletionRequest {
            self.last_request.lock().unwrap().clone().unwrap()
        }
    }

    #[async_trait]
    impl ProviderAdapter for CannedAdapter {
        fn id(&self) -> ProviderId {
            ProviderId::Anthropic
        }

        fn default_model(&self) -> &str {
            "canned"
        }

        fn is_configured(&self) -> bool {
            true
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse> {
            *self.last_request.lock().unwrap() = Some(request.clone());
            let content = self
                .reply
                .ok_or_else(|| RouterError::provider(ProviderId::Anthropic, "overloaded"))?;
            Ok(CompletionResponse {
                content: content.to_string(),
                provider_used: ProviderId::Anthropic,
                model_used: "canned".to_string(),
                tokens: TokenUsage::default(),
                estimated_cost_usd: 0.0,
                latency_ms: 0,
            })
        }

        async fn stream(&self, _request: &CompletionRequest) -> Result<ChunkStream> {
            Err(RouterError::provider(ProviderId::Anthropic, "not used"))
        }
    }

    fn assistant(adapter: &Arc<CannedAdapter>) -> AiAssistant {
        let router = AiRouter::builder().adapter(adapter.clone()).build();
        AiAssistant::new(Arc::new(router))
    }

    #[tokio::test]
    async fn test_chat_forwards_history_in_order() {
        let adapter = CannedAdapter::new(Some("Sure."));
        let history = vec![
            ChatMessage::user("Who owns the Acme deal?"),
            ChatMessage::assistant("Dana does."),
        ];

        let response = assistant(&adapter)
            .chat(&history, "Remind them tomorrow")
            .await
            .unwrap();
        assert_eq!(response.content, "Sure.");

        let sent = adapter.last_request();
        let messages = sent.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "Dana does.");
        assert_eq!(messages[2].content, "Remind them tomorrow");
        assert!(sent.system().is_some());
    }

    #[tokio::test]
    async fn test_analyze_contract_parses_json() {
        let adapter = CannedAdapter::new(Some(
            r#"{"summary":"Two-year SaaS deal","risks":["auto-renewal"],"risk_level":"medium"}"#,
        ));
        let analysis = assistant(&adapter)
            .analyze_contract("Term: 24 months, renews automatically")
            .await
            .unwrap()
            .parsed()
            .unwrap();

        assert_eq!(analysis.summary, "Two-year SaaS deal");
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert!(analysis.key_terms.is_empty());
        assert_eq!(adapter.last_request().temperature, Some(STRUCTURED_TEMPERATURE));
    }

    #[tokio::test]
    async fn test_analyze_contract_salvages_prose() {
        let adapter = CannedAdapter::new(Some("This contract looks fine overall."));
        let extraction = assistant(&adapter).analyze_contract("...").await.unwrap();
        assert!(!extraction.is_parsed());

        let analysis = extraction.into_best_effort();
        assert_eq!(analysis.summary, "This contract looks fine overall.");
        assert_eq!(analysis.risk_level, RiskLevel::Unknown);
        assert!(analysis.risks.is_empty());
    }

    #[tokio::test]
    async fn test_generate_leads_from_fenced_array() {
        let adapter = CannedAdapter::new(Some(
            "```json\n[{\"company\":\"Northwind\",\"industry\":\"Logistics\",\"score\":82}]\n```",
        ));
        let leads = assistant(&adapter)
            .generate_leads("logistics in Europe", 1)
            .await
            .unwrap()
            .into_best_effort();

        assert_eq!(leads.len(), 1);
        assert_eq!(leads[0].company, "Northwind");
        assert_eq!(leads[0].score, 82);
    }

    #[test]
    fn test_odd_lead_scores_keep_the_batch() {
        let raw = r#"[
            {"company":"Northwind","industry":"Logistics","score":8.5},
            {"company":"Contoso","score":300},
            {"company":"Fabrikam","score":"72"},
            {"company":"Tailspin","score":null},
            {"company":"Litware","score":-4}
        ]"#;

        let extraction = extract_structured::<Vec<LeadSuggestion>>(raw);
        assert!(extraction.is_parsed());

        let leads = extraction.into_best_effort();
        let scores: Vec<(&str, u8)> =
            leads.iter().map(|l| (l.company.as_str(), l.score)).collect();
        assert_eq!(
            scores,
            vec![
                ("Northwind", 9),
                ("Contoso", 100),
                ("Fabrikam", 72),
                ("Tailspin", 0),
                ("Litware", 0),
            ]
        );
        assert_eq!(leads[0].industry, "Logistics");
    }

    #[test]
    fn test_missing_score_defaults_to_zero() {
        let lead: LeadSuggestion = serde_json::from_str(r#"{"company":"Adatum"}"#).unwrap();
        assert_eq!(lead.score, 0);
    }

    #[tokio::test]
    async fn test_routing_failure_is_still_an_error() {
        let adapter = CannedAdapter::new(None);
        let err = assistant(&adapter)
            .generate_leads("anything", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::AllProvidersFailed(_)));
    }

    #[tokio::test]
    async fn test_draft_contract_uses_drafting_limits() {
        let adapter = CannedAdapter::new(Some("SERVICE AGREEMENT\n1. Parties"));
        let response = assistant(&adapter)
            .draft_contract("Consulting for Acme, 3 months, 10k/month")
            .await
            .unwrap();
        assert!(response.content.starts_with("SERVICE AGREEMENT"));

        let sent = adapter.last_request();
        assert_eq!(sent.max_tokens, Some(DRAFTING_MAX_TOKENS));
        assert!(sent.prompt.contains("Consulting for Acme"));
    }
}
