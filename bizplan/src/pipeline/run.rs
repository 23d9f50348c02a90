//! One end-to-end business plan run.

use super::{PipelineExecutor, RetryPolicy};
use crate::core::StageOutputs;
use crate::errors::{CatalogError, PipelineError};
use crate::events::{EventSink, NoOpEventSink};
use crate::gate::{EvaluationResult, QualityGate};
use crate::intake::{IntakeSchema, IntakeSnapshot};
use crate::providers::{GenerationResponse, ProviderSet};
use crate::stages::{business_plan, Stage, StageCatalog};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// The record of one finished run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineRun {
    /// Unique run id.
    pub run_id: Uuid,
    /// When the run began.
    pub started_at: DateTime<Utc>,
    /// The intake the run read.
    #[serde(skip)]
    pub snapshot: IntakeSnapshot,
    /// Every stage output, in execution order.
    pub outputs: StageOutputs,
    /// The gate's review.
    pub evaluation: EvaluationResult,
    /// The refined plan.
    pub final_response: GenerationResponse,
}

impl PipelineRun {
    /// Returns the final plan text.
    #[must_use]
    pub fn final_text(&self) -> &str {
        &self.final_response.raw
    }
}

/// A validated stage order plus the gate that finishes it.
///
/// Built once at startup; any catalog problem surfaces there rather than
/// during a request.
#[derive(Clone)]
pub struct BusinessPlanPipeline {
    stages: Arc<[Stage]>,
    gate: QualityGate,
    retry: RetryPolicy,
    temperature: f32,
    events: Arc<dyn EventSink>,
}

impl BusinessPlanPipeline {
    /// Validates `catalog` against `schema` and fixes the execution order.
    ///
    /// # Errors
    ///
    /// Returns any resolution or template error, or `UnknownDependency` if
    /// the gate's stages are not in the catalog.
    pub fn new(catalog: &StageCatalog, gate: QualityGate, schema: &IntakeSchema) -> Result<Self, CatalogError> {
        catalog.validate_templates(schema)?;
        for name in [gate.evaluate_stage(), gate.refine_stage()] {
            if !catalog.contains(name) {
                return Err(CatalogError::UnknownDependency {
                    stage: name.to_string(),
                    dependency: gate.source().to_string(),
                });
            }
        }
        let stages = catalog.resolve()?;
        tracing::debug!(stages = stages.len(), "Pipeline resolved");

        Ok(Self {
            stages: stages.into(),
            gate,
            retry: RetryPolicy::default(),
            temperature: 0.1,
            events: Arc::new(NoOpEventSink),
        })
    }

    /// The shipped business plan pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error only if the built-in catalog is inconsistent.
    pub fn business_plan() -> Result<Self, CatalogError> {
        Self::new(&business_plan::catalog()?, QualityGate::business_plan(), &IntakeSchema::business_plan())
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

    /// Returns the stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// Returns the gate.
    #[must_use]
    pub fn gate(&self) -> &QualityGate {
        &self.gate
    }

    /// Builds an executor over `providers` with this pipeline's settings.
    #[must_use]
    pub fn executor(&self, providers: ProviderSet) -> PipelineExecutor {
        PipelineExecutor::new(providers)
            .with_retry(self.retry.clone())
            .with_temperature(self.temperature)
            .with_event_sink(Arc::clone(&self.events))
    }

    /// Runs every stage and the gate.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure.
    pub async fn run(&self, providers: ProviderSet, snapshot: IntakeSnapshot) -> Result<PipelineRun, PipelineError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        let outputs = self.executor(providers).execute_run(run_id, &snapshot, &self.stages).await?;
        let outcome = self.gate.outcome(&outputs)?;

        tracing::info!(
            run_id = %run_id,
            score = ?outcome.evaluation.score,
            verdict = ?outcome.evaluation.verdict,
            final_chars = outcome.final_response.raw.len(),
            "Quality gate finished"
        );

        Ok(PipelineRun {
            run_id,
            started_at,
            snapshot,
            outputs,
            evaluation: outcome.evaluation,
            final_response: outcome.final_response,
        })
    }
}

impl std::fmt::Debug for BusinessPlanPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BusinessPlanPipeline")
            .field("stages", &self.stages.iter().map(|s| &s.name).collect::<Vec<_>>())
            .field("gate", &self.gate.source())
            .field("retry", &self.retry)
            .field("temperature", &self.temperature)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::Persona;
    use crate::testing::{eco_fashion_intake, ScriptedGenerator};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_run_yields_refined_plan_and_review() {
        let pipeline = BusinessPlanPipeline::business_plan().unwrap();
        let generator = ScriptedGenerator::new("section")
            .with_response(business_plan::EVALUATE_PLAN, "Add a budget.\nScore: 6/10\nVerdict: FAIL")
            .with_response(business_plan::REFINE_PLAN, "# Business Plan: EcoFashion\nFinal");

        let run = pipeline.run(ProviderSet::single(Arc::new(generator)), eco_fashion_intake()).await.unwrap();

        assert_eq!(run.final_text(), "# Business Plan: EcoFashion\nFinal");
        assert_eq!(run.evaluation.score, Some(6));
        assert_eq!(run.outputs.len(), 9);
        assert_eq!(run.snapshot.render("business_name"), "EcoFashion");
    }

    #[tokio::test]
    async fn test_run_record_serializes_without_snapshot() {
        let pipeline = BusinessPlanPipeline::business_plan().unwrap();
        let generator = ScriptedGenerator::new("section").with_response(business_plan::REFINE_PLAN, "# Final");

        let run = pipeline.run(ProviderSet::single(Arc::new(generator)), eco_fashion_intake()).await.unwrap();
        let json = serde_json::to_value(&run).unwrap();

        assert!(json.get("snapshot").is_none());
        assert_eq!(json["final_response"]["raw"], "# Final");
        assert_eq!(json["run_id"], serde_json::json!(run.run_id));
    }

    #[test]
    fn test_business_plan_pipeline_order() {
        let pipeline = BusinessPlanPipeline::business_plan().unwrap();
        let names: Vec<_> = pipeline.stages().iter().map(|s| s.name.as_str()).collect();

        assert_eq!(names.first(), Some(&business_plan::CREATE_BUSINESS_CONCEPT));
        assert_eq!(names.last(), Some(&business_plan::REFINE_PLAN));
    }

    #[test]
    fn test_new_rejects_catalog_without_gate() {
        let mut catalog = StageCatalog::new();
        for stage in business_plan::content_stages() {
            catalog.register_stage(stage).unwrap();
        }

        let err = BusinessPlanPipeline::new(&catalog, QualityGate::business_plan(), &IntakeSchema::business_plan())
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownDependency { ref stage, .. } if stage == "evaluate_plan"));
    }

    #[test]
    fn test_new_rejects_unknown_placeholder() {
        let mut catalog = business_plan::catalog().unwrap();
        catalog.register("extra", Persona::new("x", "y", "z"), "{no_such_field}", &[]).unwrap();

        let err = BusinessPlanPipeline::new(&catalog, QualityGate::business_plan(), &IntakeSchema::business_plan())
            .unwrap_err();
        assert!(matches!(err, CatalogError::UnknownPlaceholder { .. }));
    }
}
