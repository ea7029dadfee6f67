//! Model Pricing
//!
//! Static per-model price table used to estimate the dollar cost of a
//! completion from its token usage.

use crate::types::TokenUsage;

/// Price per million tokens, in USD
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelPricing {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl ModelPricing {
    pub const fn new(input_per_million: f64, output_per_million: f64) -> Self {
        Self {
            input_per_million,
            output_per_million,
        }
    }

    /// Cost of the given usage at this price
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        (usage.prompt as f64 * self.input_per_million
            + usage.completion as f64 * self.output_per_million)
            / 1_000_000.0
    }
}

/// Used for models missing from [`PRICE_TABLE`]
pub const DEFAULT_PRICING: ModelPricing = ModelPricing::new(3.0, 15.0);

/// Known model prices (USD per million tokens)
pub const PRICE_TABLE: &[(&str, ModelPricing)] = &[
    // OpenAI
    ("gpt-4o", ModelPricing::new(2.5, 10.0)),
    ("gpt-4o-mini", ModelPricing::new(0.15, 0.6)),
    ("gpt-4-turbo", ModelPricing::new(10.0, 30.0)),
    ("gpt-4", ModelPricing::new(30.0, 60.0)),
    ("gpt-3.5-turbo", ModelPricing::new(0.5, 1.5)),
    // Anthropic
    ("claude-3-5-sonnet-20241022", ModelPricing::new(3.0, 15.0)),
    ("claude-3-5-haiku-20241022", ModelPricing::new(0.8, 4.0)),
    ("claude-3-opus-20240229", ModelPricing::new(15.0, 75.0)),
    ("claude-3-haiku-20240307", ModelPricing::new(0.25, 1.25)),
    // Gemini
    ("gemini-1.5-pro", ModelPricing::new(1.25, 5.0)),
    ("gemini-1.5-flash", ModelPricing::new(0.075, 0.3)),
    ("gemini-2.0-flash", ModelPricing::new(0.1, 0.4)),
];

/// Exact price row for `model`, if listed
pub fn lookup(model: &str) -> Option<ModelPricing> {
    PRICE_TABLE
        .iter()
        .find(|(name, _)| *name == model)
        .map(|(_, pricing)| *pricing)
}

/// Price row for `model`, falling back to [`DEFAULT_PRICING`]
pub fn pricing_for(model: &str) -> ModelPricing {
    lookup(model).unwrap_or(DEFAULT_PRICING)
}

/// Estimated cost in USD for `usage` on `model`
pub fn estimate_cost(model: &str, usage: &TokenUsage) -> f64 {
    pricing_for(model).cost(usage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_formula_is_exact() {
        let pricing = ModelPricing::new(3.0, 15.0);
        let usage = TokenUsage::new(100, 50);
        assert_eq!(pricing.cost(&usage), 0.00105);
    }

    #[test]
    fn test_known_model_lookup() {
        let usage = TokenUsage::new(100, 50);
        assert_eq!(estimate_cost("claude-3-5-sonnet-20241022", &usage), 0.00105);
        assert_eq!(lookup("gpt-4o-mini"), Some(ModelPricing::new(0.15, 0.6)));
    }

    #[test]
    fn test_unknown_model_uses_default_row() {
        assert_eq!(lookup("some-future-model"), None);
        assert_eq!(pricing_for("some-future-model"), DEFAULT_PRICING);
    }

    #[test]
    fn test_zero_usage_costs_nothing() {
        assert_eq!(estimate_cost("gpt-4o", &TokenUsage::default()), 0.0);
    }
}
