//! Sequential stage execution.

use super::{RetryPolicy, StageInputs};
use crate::core::{StageOutput, StageOutputs};
use crate::errors::PipelineError;
use crate::events::{self, EventSink, NoOpEventSink};
use crate::intake::IntakeSnapshot;
use crate::observability::SpanTimer;
use crate::providers::{GenerationCapability, GenerationRequest, ProviderSet};
use crate::stages::Stage;
use serde_json::json;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

/// Runs stages one at a time against a frozen intake snapshot.
///
/// Each stage sees its rendered template plus the outputs of the stages it
/// declared. The first failing stage aborts the run; nothing after it is
/// invoked and no partial result is returned.
#[derive(Clone)]
pub struct PipelineExecutor {
    providers: ProviderSet,
    retry: RetryPolicy,
    temperature: f32,
    events: Arc<dyn EventSink>,
}

impl PipelineExecutor {
    /// Creates an executor with the default temperature and no retry.
    #[must_use]
    pub fn new(providers: ProviderSet) -> Self {
        Self {
            providers,
            retry: RetryPolicy::default(),
            temperature: 0.1,
            events: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Executes `stages` in the given order.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure, or `DependencyNotReady` if the order
    /// places a stage before one of its dependencies.
    pub async fn execute(&self, snapshot: &IntakeSnapshot, stages: &[Stage]) -> Result<StageOutputs, PipelineError> {
        self.execute_run(Uuid::new_v4(), snapshot, stages).await
    }

    /// Executes `stages`, tagging events and logs with `run_id`.
    ///
    /// # Errors
    ///
    /// Same as [`PipelineExecutor::execute`].
    pub async fn execute_run(
        &self,
        run_id: Uuid,
        snapshot: &IntakeSnapshot,
        stages: &[Stage],
    ) -> Result<StageOutputs, PipelineError> {
        let timer = SpanTimer::start("pipeline");
        tracing::info!(
            run_id = %run_id,
            stages = stages.len(),
            intake_version = snapshot.version(),
            "Pipeline run started"
        );
        self.events
            .emit(
                events::PIPELINE_STARTED,
                Some(json!({"run_id": run_id, "stages": stages.iter().map(|s| &s.name).collect::<Vec<_>>()})),
            )
            .await;

        let mut outputs = StageOutputs::new();
        for stage in stages {
            let span = tracing::info_span!("stage", run_id = %run_id, stage = %stage.name, kind = %stage.kind);
            if let Err(error) = self.run_stage(run_id, snapshot, stage, &mut outputs).instrument(span).await {
                tracing::error!(run_id = %run_id, stage = %stage.name, error = %error, "Pipeline run failed");
                self.events
                    .emit(
                        events::PIPELINE_FAILED,
                        Some(json!({
                            "run_id": run_id,
                            "stage": stage.name,
                            "error": error.to_string(),
                            "completed": outputs.stages(),
                        })),
                    )
                    .await;
                return Err(error);
            }
        }

        let duration_ms = timer.finish();
        tracing::info!(run_id = %run_id, duration_ms, "Pipeline run completed");
        self.events
            .emit(
                events::PIPELINE_COMPLETED,
                Some(json!({"run_id": run_id, "duration_ms": duration_ms})),
            )
            .await;

        Ok(outputs)
    }

    async fn run_stage(
        &self,
        run_id: Uuid,
        snapshot: &IntakeSnapshot,
        stage: &Stage,
        outputs: &mut StageOutputs,
    ) -> Result<(), PipelineError> {
        let prompt = {
            let inputs = StageInputs::collect(stage, outputs)?;
            inputs.compose_prompt(&stage.template.render(snapshot.record()))
        };

        let (provider_kind, provider) = self
            .providers
            .route(stage.provider)
            .ok_or_else(|| PipelineError::NoProvider(stage.name.clone()))?;
        if provider_kind != stage.provider {
            tracing::debug!(preferred = %stage.provider, using = %provider_kind, "Preferred provider unavailable");
        }

        let request = GenerationRequest {
            stage: stage.name.clone(),
            persona: stage.persona.clone(),
            prompt,
            temperature: self.temperature,
        };

        tracing::debug!(prompt_chars = request.prompt.len(), provider = %provider_kind, "Invoking stage");
        self.events
            .emit(
                events::STAGE_STARTED,
                Some(json!({"run_id": run_id, "stage": stage.name, "provider": provider_kind})),
            )
            .await;

        let timer = SpanTimer::start(&stage.name);
        let capability: &dyn GenerationCapability = provider.as_ref();
        let request_ref = &request;
        let (result, attempts) = self
            .retry
            .run(&stage.name, move || capability.generate(request_ref))
            .await;
        let duration_ms = timer.finish();

        match result {
            Ok(response) => {
                tracing::info!(
                    attempts,
                    duration_ms,
                    output_chars = response.raw.len(),
                    tokens = response.total_tokens(),
                    "Stage completed"
                );
                self.events
                    .emit(
                        events::STAGE_COMPLETED,
                        Some(json!({
                            "run_id": run_id,
                            "stage": stage.name,
                            "attempts": attempts,
                            "duration_ms": duration_ms,
                            "attributes": response.to_attributes(),
                        })),
                    )
                    .await;
                outputs.insert(StageOutput {
                    stage: stage.name.clone(),
                    kind: stage.kind,
                    response,
                    attempts,
                    duration_ms,
                });
                Ok(())
            }
            Err(source) => {
                self.events
                    .emit(
                        events::STAGE_FAILED,
                        Some(json!({
                            "run_id": run_id,
                            "stage": stage.name,
                            "attempts": attempts,
                            "error": source.to_string(),
                            "retryable": source.is_retryable(),
                        })),
                    )
                    .await;
                Err(PipelineError::StageFailed { stage: stage.name.clone(), attempts, source })
            }
        }
    }
}

impl std::fmt::Debug for PipelineExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineExecutor")
            .field("providers", &self.providers)
            .field("retry", &self.retry)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}
