//! Generation providers.
//!
//! A provider turns a persona and a prompt into text. Stages name a preferred
//! [`ProviderKind`]; a [`ProviderSet`] built from per-run [`Credentials`]
//! decides which client actually serves each call.

mod credentials;
#[cfg(feature = "http-providers")]
mod gemini;
#[cfg(feature = "http-providers")]
mod groq;
#[cfg(feature = "http-providers")]
mod http;
mod response;
mod router;

pub use credentials::{ApiKey, Credentials};
#[cfg(feature = "http-providers")]
pub use gemini::GeminiProvider;
#[cfg(feature = "http-providers")]
pub use groq::GroqProvider;
pub use response::GenerationResponse;
#[cfg(feature = "http-providers")]
pub use router::HttpProviderFactory;
pub use router::{ProviderFactory, ProviderSet};

use crate::errors::ProviderError;
use crate::stages::Persona;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The upstream LLM services a stage can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Google Gemini.
    Gemini,
    /// Groq's OpenAI-compatible API.
    Groq,
}

impl ProviderKind {
    /// Returns the other provider.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Gemini => Self::Groq,
            Self::Groq => Self::Gemini,
        }
    }

    /// Returns the lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::Groq => "groq",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    /// The stage issuing the call.
    pub stage: String,
    /// Who the model should act as.
    pub persona: Persona,
    /// The fully rendered prompt.
    pub prompt: String,
    /// Sampling temperature.
    pub temperature: f32,
}

/// Persona plus prompt in, text out.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationCapability: Send + Sync {
    /// Generates text for the request.
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_other() {
        assert_eq!(ProviderKind::Gemini.other(), ProviderKind::Groq);
        assert_eq!(ProviderKind::Groq.other(), ProviderKind::Gemini);
    }

    #[test]
    fn test_provider_kind_serde() {
        assert_eq!(serde_json::to_string(&ProviderKind::Groq).unwrap(), r#""groq""#);
        assert_eq!(ProviderKind::Gemini.to_string(), "gemini");
    }

    #[tokio::test]
    async fn test_mock_capability() {
        let mut mock = MockGenerationCapability::new();
        mock.expect_generate()
            .times(1)
            .returning(|req| Ok(GenerationResponse::text(format!("echo: {}", req.prompt))));

        let request = GenerationRequest {
            stage: "create_business_concept".into(),
            persona: Persona::new("Designer", "Design", "Experienced"),
            prompt: "hello".into(),
            temperature: 0.1,
        };
        let response = mock.generate(&request).await.unwrap();
        assert_eq!(response.raw, "echo: hello");
    }
}
