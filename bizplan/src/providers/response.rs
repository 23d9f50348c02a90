//! Generation response type.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The text produced by one generation call, with provider metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text.
    pub raw: String,
    /// The model that produced it.
    pub model: String,
    /// The provider that served it.
    pub provider: String,
    /// Prompt tokens, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<u32>,
    /// Completion tokens, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<u32>,
    /// Round-trip latency.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<f64>,
    /// Why generation stopped, if reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

impl GenerationResponse {
    /// Creates a response carrying only text.
    #[must_use]
    pub fn text(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            model: String::new(),
            provider: String::new(),
            input_tokens: None,
            output_tokens: None,
            latency_ms: None,
            finish_reason: None,
        }
    }

    /// Sets the model and provider.
    #[must_use]
    pub fn with_source(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.provider = provider.into();
        self.model = model.into();
        self
    }

    /// Sets token usage.
    #[must_use]
    pub fn with_usage(mut self, input: Option<u32>, output: Option<u32>) -> Self {
        self.input_tokens = input;
        self.output_tokens = output;
        self
    }

    /// Returns total tokens.
    #[must_use]
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens.unwrap_or(0).saturating_add(self.output_tokens.unwrap_or(0))
    }

    /// Converts to structured log attributes.
    #[must_use]
    pub fn to_attributes(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("llm.model".to_string(), serde_json::json!(self.model));
        map.insert("llm.provider".to_string(), serde_json::json!(self.provider));
        if let Some(t) = self.input_tokens {
            map.insert("llm.input_tokens".to_string(), serde_json::json!(t));
        }
        if let Some(t) = self.output_tokens {
            map.insert("llm.output_tokens".to_string(), serde_json::json!(t));
        }
        map.insert("llm.total_tokens".to_string(), serde_json::json!(self.total_tokens()));
        if let Some(l) = self.latency_ms {
            map.insert("llm.latency_ms".to_string(), serde_json::json!(l));
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_tokens() {
        let response = GenerationResponse::text("plan").with_usage(Some(10), Some(32));
        assert_eq!(response.total_tokens(), 42);
        assert_eq!(GenerationResponse::text("x").total_tokens(), 0);
    }

    #[test]
    fn test_total_tokens_saturates() {
        let response = GenerationResponse::text("plan").with_usage(Some(u32::MAX), Some(1));
        assert_eq!(response.total_tokens(), u32::MAX);
    }

    #[test]
    fn test_serialization_skips_missing_metadata() {
        let response = GenerationResponse::text("plan").with_source("groq", "llama");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(json["raw"], "plan");
        assert_eq!(json["provider"], "groq");
        assert!(json.get("input_tokens").is_none());
    }

    #[test]
    fn test_attributes() {
        let response = GenerationResponse::text("plan").with_usage(Some(1), None);
        let attrs = response.to_attributes();

        assert_eq!(attrs["llm.input_tokens"], serde_json::json!(1));
        assert!(!attrs.contains_key("llm.output_tokens"));
    }
}
