//! The evaluate-then-refine quality gate.
//!
//! The gate adds two stages after a consolidation stage: one reviews the
//! consolidated document, the other rewrites it using the review. It runs
//! exactly once per pipeline run.

use crate::core::{StageKind, StageOutputs};
use crate::errors::{CatalogError, PipelineError};
use crate::providers::GenerationResponse;
use crate::stages::{business_plan, Stage, StageCatalog};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Pass/fail judgement extracted from evaluation feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// The plan is acceptable.
    Pass,
    /// The plan needs work.
    Fail,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass => f.write_str("PASS"),
            Self::Fail => f.write_str("FAIL"),
        }
    }
}

/// The evaluator's review of the consolidated plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// The full review text.
    pub feedback: String,
    /// Score out of 10, from a `Score: N/10` line.
    pub score: Option<u8>,
    /// From a `Verdict: PASS|FAIL` line.
    pub verdict: Option<Verdict>,
}

#[allow(clippy::expect_used)]
fn score_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[\s*_#>-]*score[\s*_]*:[\s*_]*(\d{1,2})(?:\.\d+)?\s*/\s*10\b").expect("score regex")
    })
}

#[allow(clippy::expect_used)]
fn verdict_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?im)^[\s*_#>-]*verdict[\s*_]*:[\s*_]*(pass|fail)\b").expect("verdict regex")
    })
}

impl EvaluationResult {
    /// Parses the optional score and verdict out of feedback text. The last
    /// matching line wins.
    #[must_use]
    pub fn parse(feedback: impl Into<String>) -> Self {
        let feedback = feedback.into();

        let score = score_re()
            .captures_iter(&feedback)
            .filter_map(|c| c[1].parse::<u8>().ok())
            .filter(|s| *s <= 10)
            .last();
        let verdict = verdict_re().captures_iter(&feedback).last().map(|c| {
            if c[1].eq_ignore_ascii_case("pass") {
                Verdict::Pass
            } else {
                Verdict::Fail
            }
        });

        Self { feedback, score, verdict }
    }
}

/// What the gate yields after a run.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    /// The parsed review.
    pub evaluation: EvaluationResult,
    /// The refined document.
    pub final_response: GenerationResponse,
}

/// Configuration of the two gate stages.
#[derive(Debug, Clone)]
pub struct QualityGate {
    source: String,
    evaluate: Stage,
    refine: Stage,
}

impl QualityGate {
    /// Creates a gate reviewing the output of `source`.
    ///
    /// The evaluate stage is wired to read `source`; the refine stage reads
    /// `source` then the evaluate stage. Any dependencies already on the
    /// given stages are replaced.
    #[must_use]
    pub fn new(source: impl Into<String>, mut evaluate: Stage, mut refine: Stage) -> Self {
        let source = source.into();
        evaluate.depends_on = vec![source.clone()];
        evaluate.kind = StageKind::Evaluate;
        refine.depends_on = vec![source.clone(), evaluate.name.clone()];
        refine.kind = StageKind::Refine;
        Self { source, evaluate, refine }
    }

    /// The gate used by the business plan catalog.
    #[must_use]
    pub fn business_plan() -> Self {
        Self::new(
            business_plan::CONSOLIDATE_PLAN,
            business_plan::evaluate_stage(),
            business_plan::refine_stage(),
        )
    }

    /// Registers the evaluate and refine stages.
    ///
    /// # Errors
    ///
    /// Returns `UnknownDependency` if the source stage is not registered yet,
    /// or any registration error.
    pub fn attach(&self, catalog: &mut StageCatalog) -> Result<(), CatalogError> {
        if !catalog.contains(&self.source) {
            return Err(CatalogError::UnknownDependency {
                stage: self.evaluate.name.clone(),
                dependency: self.source.clone(),
            });
        }
        catalog.register_stage(self.evaluate.clone())?;
        catalog.register_stage(self.refine.clone())?;
        Ok(())
    }

    /// Returns the name of the reviewed stage.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the evaluate stage name.
    #[must_use]
    pub fn evaluate_stage(&self) -> &str {
        &self.evaluate.name
    }

    /// Returns the refine stage name.
    #[must_use]
    pub fn refine_stage(&self) -> &str {
        &self.refine.name
    }

    /// Extracts the review and the final document from a finished run.
    ///
    /// # Errors
    ///
    /// Returns `MissingOutput` if either gate stage did not run.
    pub fn outcome(&self, outputs: &StageOutputs) -> Result<GateOutcome, PipelineError> {
        let evaluation = outputs
            .get(&self.evaluate.name)
            .ok_or_else(|| PipelineError::MissingOutput(self.evaluate.name.clone()))?;
        let refined = outputs
            .get(&self.refine.name)
            .ok_or_else(|| PipelineError::MissingOutput(self.refine.name.clone()))?;

        Ok(GateOutcome {
            evaluation: EvaluationResult::parse(evaluation.text()),
            final_response: refined.response.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageOutput;
    use crate::stages::Persona;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_score_and_verdict() {
        let result = EvaluationResult::parse("Solid plan.\n- add a cash-flow table\n\nScore: 7/10\nVerdict: PASS");

        assert_eq!(result.score, Some(7));
        assert_eq!(result.verdict, Some(Verdict::Pass));
        assert!(result.feedback.starts_with("Solid plan."));
    }

    #[test]
    fn test_parse_markdown_decorated_lines() {
        let result = EvaluationResult::parse("**Score:** 4 / 10\n**Verdict:** fail");

        assert_eq!(result.score, Some(4));
        assert_eq!(result.verdict, Some(Verdict::Fail));
    }

    #[test]
    fn test_parse_without_markers() {
        let result = EvaluationResult::parse("Looks fine, scores well overall.");

        assert_eq!(result.score, None);
        assert_eq!(result.verdict, None);
    }

    #[test]
    fn test_out_of_range_score_ignored() {
        assert_eq!(EvaluationResult::parse("Score: 42/10").score, None);
    }

    #[test]
    fn test_new_rewires_dependencies() {
        let persona = Persona::new("r", "g", "b");
        let gate = QualityGate::new(
            "merge",
            Stage::new("review", persona.clone(), "t").with_dependency("elsewhere"),
            Stage::new("rewrite", persona, "t"),
        );

        let mut catalog = StageCatalog::new();
        catalog.register("merge", Persona::new("m", "g", "b"), "t", &[]).unwrap();
        gate.attach(&mut catalog).unwrap();

        assert_eq!(catalog.get("review").unwrap().depends_on, vec!["merge".to_string()]);
        assert_eq!(catalog.get("review").unwrap().kind, StageKind::Evaluate);
        assert_eq!(
            catalog.get("rewrite").unwrap().depends_on,
            vec!["merge".to_string(), "review".to_string()]
        );
        assert_eq!(catalog.resolve_order().unwrap(), vec!["merge", "review", "rewrite"]);
    }

    #[test]
    fn test_attach_requires_source() {
        let mut catalog = StageCatalog::new();
        let err = QualityGate::business_plan().attach(&mut catalog).unwrap_err();

        assert!(matches!(err, CatalogError::UnknownDependency { ref dependency, .. } if dependency == "consolidate_plan"));
    }

    #[test]
    fn test_outcome() {
        let gate = QualityGate::business_plan();
        let mut outputs = StageOutputs::new();
        for (stage, text) in [("evaluate_plan", "Score: 8/10"), ("refine_plan", "# Final")] {
            outputs.insert(StageOutput {
                stage: stage.to_string(),
                kind: StageKind::Content,
                response: GenerationResponse::text(text),
                attempts: 1,
                duration_ms: 1.0,
            });
        }

        let outcome = gate.outcome(&outputs).unwrap();
        assert_eq!(outcome.evaluation.score, Some(8));
        assert_eq!(outcome.final_response.raw, "# Final");
    }

    #[test]
    fn test_outcome_missing_refine() {
        let gate = QualityGate::business_plan();
        let err = gate.outcome(&StageOutputs::new()).unwrap_err();
        assert!(matches!(err, PipelineError::MissingOutput(ref s) if s == "evaluate_plan"));
    }
}
