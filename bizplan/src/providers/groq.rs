//! Groq client over the OpenAI-compatible chat completions API.

use super::http::{build_client, check_status, endpoint, map_transport_error};
use super::{ApiKey, GenerationCapability, GenerationRequest, GenerationResponse};
use crate::config::ProviderConfig;
use crate::errors::{ConfigError, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const PROVIDER: &str = "groq";

/// Groq chat completions client bound to one API key.
pub struct GroqProvider {
    client: Client,
    api_key: ApiKey,
    model: String,
    base_url: String,
    max_output_tokens: Option<u32>,
}

impl GroqProvider {
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

    fn body(&self, request: &GenerationRequest) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: request.persona.system_prompt() },
                ChatMessage { role: "user".to_string(), content: request.prompt.clone() },
            ],
            temperature: request.temperature,
            max_tokens: self.max_output_tokens,
        }
    }
}

#[async_trait]
impl GenerationCapability for GroqProvider {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let started = Instant::now();

        tracing::debug!(stage = %request.stage, model = %self.model, "Calling Groq");

        let response = self
            .client
            .post(endpoint(&self.base_url, "chat/completions"))
            .bearer_auth(self.api_key.expose())
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| map_transport_error(PROVIDER, &e))?;
        let response = check_status(PROVIDER, response).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| map_transport_error(PROVIDER, &e))?;

        let mut generated = parse_response(body, &self.model)?;
        generated.latency_ms = Some(started.elapsed().as_secs_f64() * 1000.0);
        Ok(generated)
    }
}

fn parse_response(body: ChatResponse, model: &str) -> Result<GenerationResponse, ProviderError> {
    let choice = body.choices.into_iter().next().ok_or_else(|| ProviderError::MalformedResponse {
        provider: PROVIDER.to_string(),
        message: "no choices in response".to_string(),
    })?;

    let text = choice.message.content.unwrap_or_default();
    if text.is_empty() {
        return Err(ProviderError::MalformedResponse {
            provider: PROVIDER.to_string(),
            message: "choice has no content".to_string(),
        });
    }

    let usage = body.usage.unwrap_or_default();
    let mut response = GenerationResponse::text(text)
        .with_source(PROVIDER, body.model.unwrap_or_else(|| model.to_string()))
        .with_usage(usage.prompt_tokens, usage.completion_tokens);
    response.finish_reason = choice.finish_reason;
    Ok(response)
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Persona;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<GenerationResponse, ProviderError> {
        parse_response(serde_json::from_value(value).unwrap(), "llama-test")
    }

    #[test]
    fn test_parse_first_choice() {
        let response = parse(json!({
            "model": "llama-3.3-70b-versatile",
            "choices": [{"message": {"role": "assistant", "content": "Feedback"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 7}
        }))
        .unwrap();

        assert_eq!(response.raw, "Feedback");
        assert_eq!(response.model, "llama-3.3-70b-versatile");
        assert_eq!(response.total_tokens(), 12);
    }

    #[test]
    fn test_parse_empty_content() {
        let err = parse(json!({"choices": [{"message": {"content": null}}]})).unwrap_err();
        assert!(matches!(err, ProviderError::MalformedResponse { .. }));
    }

    #[test]
    fn test_request_body_shape() {
        let provider = GroqProvider::new(ApiKey::new("gsk").unwrap(), &ProviderConfig::groq()).unwrap();
        let request = GenerationRequest {
            stage: "evaluate_plan".into(),
            persona: Persona::new("Evaluator", "Review", "Analyst"),
            prompt: "Evaluate".into(),
            temperature: 0.1,
        };

        let body = serde_json::to_value(provider.body(&request)).unwrap();
        assert_eq!(body["model"], "llama-3.3-70b-versatile");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "Evaluate");
    }
}
