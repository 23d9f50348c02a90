//! Stub generation capabilities.

use async_trait::async_trait;
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{ConfigError, ProviderError};
use crate::providers::{
    Credentials, GenerationCapability, GenerationRequest, GenerationResponse, ProviderFactory, ProviderKind,
    ProviderSet,
};

const STUB_PROVIDER: &str = "stub";
const STUB_MODEL: &str = "stub-model";

/// Returns text derived only from the persona and the prompt.
///
/// The same request always yields the same text, so whole runs are
/// reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeterministicGenerator;

impl DeterministicGenerator {
    /// Creates the generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Returns the text produced for `request`.
    #[must_use]
    pub fn text_for(request: &GenerationRequest) -> String {
        let mut hasher = Sha256::new();
        hasher.update(request.persona.system_prompt().as_bytes());
        hasher.update([0u8]);
        hasher.update(request.prompt.as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("{} output {}", request.persona.role, &digest[..16])
    }
}

#[async_trait]
impl GenerationCapability for DeterministicGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        Ok(GenerationResponse::text(Self::text_for(request)).with_source(STUB_PROVIDER, STUB_MODEL))
    }
}

/// Returns fixed text per stage.
#[derive(Debug, Clone)]
pub struct ScriptedGenerator {
    fallback: String,
    responses: HashMap<String, String>,
}

impl ScriptedGenerator {
    /// Unscripted stages answer `"<fallback> for <stage>"`.
    #[must_use]
    pub fn new(fallback: impl Into<String>) -> Self {
        Self { fallback: fallback.into(), responses: HashMap::new() }
    }

    /// Scripts the text for one stage.
    #[must_use]
    pub fn with_response(mut self, stage: impl Into<String>, text: impl Into<String>) -> Self {
        self.responses.insert(stage.into(), text.into());
        self
    }
}

#[async_trait]
impl GenerationCapability for ScriptedGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        let text = self
            .responses
            .get(&request.stage)
            .cloned()
            .unwrap_or_else(|| format!("{} for {}", self.fallback, request.stage));
        Ok(GenerationResponse::text(text).with_source(STUB_PROVIDER, STUB_MODEL))
    }
}

/// Fails on one stage and behaves like [`DeterministicGenerator`] elsewhere.
#[derive(Debug, Clone)]
pub struct FailingGenerator {
    stage: String,
    error: ProviderError,
}

impl FailingGenerator {
    /// Fails `stage` with an upstream 500.
    #[must_use]
    pub fn on_stage(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            error: ProviderError::Upstream {
                provider: STUB_PROVIDER.to_string(),
                status: 500,
                message: "injected failure".to_string(),
            },
        }
    }

    /// Sets the error returned.
    #[must_use]
    pub fn with_error(mut self, error: ProviderError) -> Self {
        self.error = error;
        self
    }
}

#[async_trait]
impl GenerationCapability for FailingGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        if request.stage == self.stage {
            return Err(self.error.clone());
        }
        DeterministicGenerator.generate(request).await
    }
}

/// Records every request before delegating to an inner capability.
#[derive(Debug, Default)]
pub struct RecordingGenerator<G> {
    inner: G,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl<G> RecordingGenerator<G> {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: G) -> Self {
        Self { inner, requests: Mutex::new(Vec::new()) }
    }

    /// Returns all recorded requests.
    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }

    /// Returns the stage names in call order.
    #[must_use]
    pub fn stages(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.stage.clone()).collect()
    }

    /// Returns the latest request for a stage.
    #[must_use]
    pub fn request_for(&self, stage: &str) -> Option<GenerationRequest> {
        self.requests.lock().iter().rev().find(|r| r.stage == stage).cloned()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.requests.lock().len()
    }

    /// Returns true if never called.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requests.lock().is_empty()
    }
}

#[async_trait]
impl<G: GenerationCapability> GenerationCapability for RecordingGenerator<G> {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, ProviderError> {
        self.requests.lock().push(request.clone());
        self.inner.generate(request).await
    }
}

/// Serves one capability for every provider whose key was supplied.
#[derive(Clone)]
pub struct StaticProviderFactory {
    capability: Arc<dyn GenerationCapability>,
    built: Arc<Mutex<Vec<Vec<ProviderKind>>>>,
}

impl StaticProviderFactory {
    /// Creates the factory.
    #[must_use]
    pub fn new(capability: Arc<dyn GenerationCapability>) -> Self {
        Self { capability, built: Arc::new(Mutex::new(Vec::new())) }
    }

    /// Returns the provider kinds of each set built so far.
    #[must_use]
    pub fn built_kinds(&self) -> Vec<Vec<ProviderKind>> {
        self.built.lock().clone()
    }
}

impl ProviderFactory for StaticProviderFactory {
    fn build(&self, credentials: &Credentials) -> Result<ProviderSet, ConfigError> {
        let mut set = ProviderSet::new();
        for kind in [ProviderKind::Gemini, ProviderKind::Groq] {
            if credentials.get(kind).is_some() {
                set = set.with_provider(kind, Arc::clone(&self.capability));
            }
        }
        self.built.lock().push(set.kinds());
        Ok(set)
    }
}

impl std::fmt::Debug for StaticProviderFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticProviderFactory").field("built", &self.built.lock().len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Persona;

    fn request(stage: &str, prompt: &str) -> GenerationRequest {
        GenerationRequest {
            stage: stage.into(),
            persona: Persona::new("Market Analyst", "Analyse", "Analyst"),
            prompt: prompt.into(),
            temperature: 0.1,
        }
    }

    #[tokio::test]
    async fn test_deterministic_is_keyed_on_persona_and_prompt() {
        let generator = DeterministicGenerator::new();
        let a = generator.generate(&request("s1", "same")).await.unwrap();
        let b = generator.generate(&request("s2", "same")).await.unwrap();
        let c = generator.generate(&request("s1", "different")).await.unwrap();

        assert_eq!(a.raw, b.raw);
        assert_ne!(a.raw, c.raw);
        assert!(a.raw.starts_with("Market Analyst output "));
    }

    #[tokio::test]
    async fn test_scripted_fallback() {
        let generator = ScriptedGenerator::new("text").with_response("s1", "scripted");

        assert_eq!(generator.generate(&request("s1", "p")).await.unwrap().raw, "scripted");
        assert_eq!(generator.generate(&request("s2", "p")).await.unwrap().raw, "text for s2");
    }

    #[tokio::test]
    async fn test_failing_and_recording() {
        let generator = RecordingGenerator::new(FailingGenerator::on_stage("s2"));

        assert!(generator.generate(&request("s1", "p")).await.is_ok());
        assert!(generator.generate(&request("s2", "p")).await.is_err());
        assert_eq!(generator.stages(), vec!["s1", "s2"]);
        assert_eq!(generator.request_for("s2").unwrap().prompt, "p");
    }

    #[test]
    fn test_static_factory_follows_credentials() {
        let factory = StaticProviderFactory::new(Arc::new(DeterministicGenerator::new()));
        let set = factory.build(&Credentials::new(Some("g"), Some("q"))).unwrap();

        assert_eq!(set.kinds(), vec![ProviderKind::Gemini, ProviderKind::Groq]);
        assert!(factory.build(&Credentials::default()).unwrap().is_empty());
        assert_eq!(factory.built_kinds().len(), 2);
    }
}
