//! Provider Selection
//!
//! Deterministic keyword/length heuristics that pick a preferred provider
//! for a request. An explicit provider on the request always wins.
//!
//! Order of checks on the lowercased prompt:
//! 1. longer than the threshold, or an analytical keyword → analytical provider
//! 2. a generative keyword → generative provider
//! 3. otherwise → analytical provider

use crate::constants::routing;
use crate::types::{CompletionRequest, ProviderId};

#[derive(Debug, Clone)]
pub struct ProviderSelector {
    long_prompt_threshold: usize,
}

impl Default for ProviderSelector {
    fn default() -> Self {
        Self::new(routing::LONG_PROMPT_THRESHOLD)
    }
}

impl ProviderSelector {
    pub fn new(long_prompt_threshold: usize) -> Self {
        Self {
            long_prompt_threshold,
        }
    }

    pub fn select(&self, request: &CompletionRequest) -> ProviderId {
        if let Some(provider) = request.provider.concrete() {
            return provider;
        }
        self.classify(&request.prompt)
    }

    /// Heuristic choice for a prompt, ignoring any override
    pub fn classify(&self, prompt: &str) -> ProviderId {
        let text = prompt.to_lowercase();

        if prompt.chars().count() > self.long_prompt_threshold
            || contains_any(&text, routing::ANALYTICAL_KEYWORDS)
        {
            return routing::ANALYTICAL_PROVIDER;
        }

        if contains_any(&text, routing::GENERATIVE_KEYWORDS) {
            return routing::GENERATIVE_PROVIDER;
        }

        routing::ANALYTICAL_PROVIDER
    }
}

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// Select with the default threshold
pub fn select_provider(request: &CompletionRequest) -> ProviderId {
    ProviderSelector::default().select(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProviderOverride;
    use proptest::prelude::*;

    #[test]
    fn test_summarize_goes_to_generative_provider() {
        let request = CompletionRequest::new("Summarize this document");
        assert_eq!(select_provider(&request), ProviderId::OpenAi);
    }

    #[test]
    fn test_contract_analysis_goes_to_analytical_provider() {
        let request = CompletionRequest::new("Analyze this contract for risks");
        assert_eq!(select_provider(&request), ProviderId::Anthropic);
    }

    #[test]
    fn test_analytical_keywords_checked_before_generative() {
        let request = CompletionRequest::new("Write code that parses invoices");
        assert_eq!(select_provider(&request), ProviderId::Anthropic);
    }

    #[test]
    fn test_json_request_goes_to_generative_provider() {
        let request = CompletionRequest::new("Return JSON with the customer fields");
        assert_eq!(select_provider(&request), ProviderId::OpenAi);
    }

    #[test]
    fn test_everyday_words_do_not_trigger_keywords() {
        let selector = ProviderSelector::default();
        assert!(!contains_any("a realistic specialist", routing::ANALYTICAL_KEYWORDS));
        assert!(!contains_any("a realistic specialist", routing::GENERATIVE_KEYWORDS));
        // falls through to the default, not the generative branch
        assert_eq!(
            selector.classify("Ask the specialist about the asterisk"),
            ProviderId::Anthropic
        );
        assert_eq!(
            selector.classify("Give me a realistic summary plan, then summarize it"),
            ProviderId::OpenAi
        );
    }

    #[test]
    fn test_no_keywords_defaults_to_analytical() {
        let request = CompletionRequest::new("Hello there");
        assert_eq!(select_provider(&request), ProviderId::Anthropic);
    }

    #[test]
    fn test_empty_prompt_falls_through_to_default() {
        let request = CompletionRequest::new("");
        assert_eq!(select_provider(&request), ProviderId::Anthropic);
    }

    #[test]
    fn test_long_prompt_threshold_is_exclusive() {
        let selector = ProviderSelector::new(10);
        assert_eq!(selector.classify("write 1234"), ProviderId::OpenAi);
        assert_eq!(selector.classify("write 12345"), ProviderId::Anthropic);
    }

    #[test]
    fn test_explicit_gemini_is_kept() {
        let request = CompletionRequest::new("Summarize this").with_provider(ProviderOverride::Gemini);
        assert_eq!(select_provider(&request), ProviderId::Gemini);
    }

    fn concrete_override() -> impl Strategy<Value = ProviderId> {
        prop_oneof![
            Just(ProviderId::OpenAi),
            Just(ProviderId::Anthropic),
            Just(ProviderId::Gemini),
        ]
    }

    proptest! {
        #[test]
        fn prop_explicit_override_always_wins(prompt in ".{0,200}", provider in concrete_override()) {
            let request = CompletionRequest::new(prompt).with_provider(provider);
            prop_assert_eq!(select_provider(&request), provider);
        }

        #[test]
        fn prop_long_prompts_go_to_analytical_provider(extra in 1usize..500, filler in "[a-z ]{1}") {
            let prompt = format!("write json {}", filler.repeat(10_000 + extra));
            let request = CompletionRequest::new(prompt);
            prop_assert_eq!(select_provider(&request), ProviderId::Anthropic);
        }
    }
}
