//! Google Gemini `generateContent` client.

use super::http::{build_client, check_status, endpoint, map_transport_error};
use super::{ApiKey, GenerationCapability, GenerationRequest, GenerationResponse};
use crate::config::ProviderConfig;
use crate::errors::{ConfigError, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const PROVIDER: &str = "gemini";

/// Gemini REST client bound to one API key.
pub struct GeminiProvider {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    max_output_tokens: Option<u32>,
}

impl GeminiProvider {
    /// Creates a client from provider settings.
    pub fn new(api_key: ApiKey, config: &ProviderConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: build_client(config)?,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn body(&self, request: &GenerationRequest) -> GeminiRequest {
        GeminiRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: request.persona.system_prompt() }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: request.prompt.clone() }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        }
    }
}

#[async_trait]
impl GenerationCapability for GeminiProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let url = endpoint(&self.base_url, &format!("models/{}:generateContent", self.model));
        let started = Instant::now();

        tracing::debug!(stage = %request.stage, model = %self.model, "Calling Gemini");

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| map_transport_error(PROVIDER, &e))?;
        let response = check_status(PROVIDER, response).await?;
        let body: GeminiResponse = response
            .json()
            .await
            .map_err(|e| map_transport_error(PROVIDER, &e))?;

        let mut generated = parse_response(body, &self.model)?;
        generated.latency_ms = Some(started.elapsed().as_secs_f64() * 1000.0);
        Ok(generated)
    }
}

fn parse_response(body: GeminiResponse, model: &str) -> Result<GenerationResponse, ProviderError> {
    let candidate = body.candidates.into_iter().next().ok_or_else(|| {
        ProviderError::MalformedResponse {
            provider: PROVIDER.to_string(),
            message: "no candidates in response".to_string(),
        }
    })?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ProviderError::MalformedResponse {
            provider: PROVIDER.to_string(),
            message: format!(
                "candidate has no text (finish reason: {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            ),
        });
    }

    let usage = body.usage_metadata.unwrap_or_default();
    let mut response = GenerationResponse::text(text)
        .with_source(PROVIDER, body.model_version.unwrap_or_else(|| model.to_string()))
        .with_usage(usage.prompt_token_count, usage.candidates_token_count);
    response.finish_reason = candidate.finish_reason;
    Ok(response)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: Content,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Persona;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<GenerationResponse, ProviderError> {
        parse_response(serde_json::from_value(value).unwrap(), "gemini-test")
    }

    #[test]
    fn test_parse_joins_parts() {
        let response = parse(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": "# Plan"}, {"text": "\nBody"}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 30}
        }))
        .unwrap();

        assert_eq!(response.raw, "# Plan\nBody");
        assert_eq!(response.model, "gemini-test");
        assert_eq!(response.provider, "gemini");
        assert_eq!(response.total_tokens(), 42);
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
    }

    #[test]
    fn test_parse_no_candidates() {
        let err = parse(json!({"candidates": []})).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_parse_blocked_candidate() {
        let err = parse(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_request_body_shape() {
        let provider = GeminiProvider::new(
            ApiKey::new("key").unwrap(),
            &ProviderConfig::gemini(),
        )
        .unwrap();
        let request = GenerationRequest {
            stage: "create_business_concept".into(),
            persona: Persona::new("Business Designer", "Design the concept", "Seasoned founder"),
            prompt: "Write the concept".into(),
            temperature: 0.1,
        };

        let body = serde_json::to_value(provider.body(&request)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Write the concept");
        assert!(body["systemInstruction"]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("Business Designer"));
        assert!(body["systemInstruction"].get("role").is_none());
    }
}
