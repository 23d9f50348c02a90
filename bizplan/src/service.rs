//! The generation service behind the HTTP boundary.
//!
//! A request carries the intake answers and the caller's provider keys.
//! The service checks the keys, parses the intake, builds per-request
//! providers and runs the pipeline under one end-to-end deadline.

use crate::delivery::BusinessPlanDocument;
use crate::errors::ServiceError;
use crate::intake::{IntakeSchema, IntakeSnapshot};
use crate::pipeline::{BusinessPlanPipeline, PipelineRun};
use crate::providers::{Credentials, ProviderFactory};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Body of a generation request: provider keys plus intake fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    /// Gemini API key.
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    /// Groq API key.
    #[serde(default)]
    pub groq_api_key: Option<String>,
    /// Every other key, parsed against the intake schema.
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl GenerateRequest {
    /// Returns the supplied credentials.
    #[must_use]
    pub fn credentials(&self) -> Credentials {
        Credentials::new(self.gemini_api_key.as_deref(), self.groq_api_key.as_deref())
    }
}

/// Runs business plan generation for one request at a time.
#[derive(Clone)]
pub struct GenerationService {
    schema: IntakeSchema,
    pipeline: BusinessPlanPipeline,
    factory: Arc<dyn ProviderFactory>,
    timeout: Duration,
}

impl GenerationService {
    /// Creates a service with the default five-minute deadline.
    #[must_use]
    pub fn new(schema: IntakeSchema, pipeline: BusinessPlanPipeline, factory: Arc<dyn ProviderFactory>) -> Self {
        Self { schema, pipeline, factory, timeout: Duration::from_secs(300) }
    }

    /// Builds the service from configuration with HTTP providers.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the built-in catalog fails to
    /// resolve.
    #[cfg(feature = "http-providers")]
    pub fn from_config(config: &crate::config::AppConfig) -> Result<Self, ServiceError> {
        let pipeline = BusinessPlanPipeline::business_plan()
            .map_err(|e| crate::errors::ConfigError::Invalid(e.to_string()))?
            .with_retry(config.pipeline.retry.clone())
            .with_temperature(config.pipeline.temperature)
            .with_event_sink(Arc::new(crate::events::LoggingEventSink::debug()));
        let factory = Arc::new(crate::providers::HttpProviderFactory::new(config.providers.clone()));

        Ok(Self::new(IntakeSchema::business_plan(), pipeline, factory)
            .with_timeout(config.pipeline.request_timeout()))
    }

    /// Sets the end-to-end deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &BusinessPlanPipeline {
        &self.pipeline
    }

    /// Returns the intake schema.
    #[must_use]
    pub fn schema(&self) -> &IntakeSchema {
        &self.schema
    }

    /// Runs the full pipeline and returns the run record.
    ///
    /// # Errors
    ///
    /// `MissingCredential` before anything else, then intake, provider
    /// construction, stage failure or timeout errors.
    pub async fn run(&self, request: &GenerateRequest) -> Result<PipelineRun, ServiceError> {
        let credentials = request.credentials();
        if credentials.is_empty() {
            tracing::warn!("Generation request without provider credentials");
            return Err(ServiceError::MissingCredential);
        }

        let record = self.schema.parse(&request.fields)?;
        let snapshot = IntakeSnapshot::from(record);
        let providers = self.factory.build(&credentials)?;
        if providers.is_empty() {
            return Err(ServiceError::MissingCredential);
        }

        tracing::info!(
            business = %snapshot.render("business_name"),
            providers = ?providers.kinds(),
            "Generating business plan"
        );

        tokio::time::timeout(self.timeout, self.pipeline.run(providers, snapshot))
            .await
            .map_err(|_| ServiceError::Timeout(self.timeout))?
            .map_err(ServiceError::from)
    }

    /// Runs the pipeline and returns the deliverable document.
    ///
    /// # Errors
    ///
    /// Same as [`GenerationService::run`], plus `Delivery` when the refined
    /// plan is blank.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<BusinessPlanDocument, ServiceError> {
        let run = self.run(request).await?;
        Ok(BusinessPlanDocument::from_response(&run.final_response)?)
    }
}

impl std::fmt::Debug for GenerationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationService")
            .field("pipeline", &self.pipeline)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
