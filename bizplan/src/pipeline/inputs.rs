//! Per-stage view of earlier outputs.

use crate::core::StageOutputs;
use crate::errors::PipelineError;
use crate::stages::Stage;

/// Heading that introduces dependency outputs in a prompt.
pub const CONTEXT_HEADING: &str = "# Context from earlier stages";

/// The outputs a stage declared it reads, in declaration order.
///
/// Only declared dependencies are visible; everything else produced so far
/// in the run is out of reach.
#[derive(Debug, Clone)]
pub struct StageInputs<'a> {
    stage: &'a str,
    dependencies: Vec<(&'a str, &'a str)>,
}

impl<'a> StageInputs<'a> {
    /// Collects the dependency outputs for a stage.
    ///
    /// # Errors
    ///
    /// Returns `DependencyNotReady` if a declared dependency has not run yet.
    pub fn collect(stage: &'a Stage, outputs: &'a StageOutputs) -> Result<Self, PipelineError> {
        let dependencies = stage
            .depends_on
            .iter()
            .map(|dep| {
                outputs.text(dep).map(|text| (dep.as_str(), text)).ok_or_else(|| {
                    PipelineError::DependencyNotReady {
                        stage: stage.name.clone(),
                        dependency: dep.clone(),
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { stage: &stage.name, dependencies })
    }

    /// Gets a declared dependency's text.
    #[must_use]
    pub fn get(&self, dependency: &str) -> Option<&'a str> {
        self.dependencies.iter().find(|(name, _)| *name == dependency).map(|(_, text)| *text)
    }

    /// Returns the stage the inputs belong to.
    #[must_use]
    pub fn stage(&self) -> &str {
        self.stage
    }

    /// Returns the number of dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    /// Returns true if the stage has no dependencies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Appends every dependency output to the rendered template, one
    /// `## <stage>` section each.
    #[must_use]
    pub fn compose_prompt(&self, rendered: &str) -> String {
        if self.dependencies.is_empty() {
            return rendered.to_string();
        }

        let mut prompt = String::with_capacity(
            rendered.len() + self.dependencies.iter().map(|(n, t)| n.len() + t.len() + 8).sum::<usize>() + 40,
        );
        prompt.push_str(rendered.trim_end());
        prompt.push_str("\n\n");
        prompt.push_str(CONTEXT_HEADING);
        for (name, text) in &self.dependencies {
            prompt.push_str("\n\n## ");
            prompt.push_str(name);
            prompt.push('\n');
            prompt.push_str(text.trim_end());
        }
        prompt.push('\n');
        prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StageKind, StageOutput};
    use crate::providers::GenerationResponse;
    use crate::stages::Persona;
    use pretty_assertions::assert_eq;

    fn outputs(entries: &[(&str, &str)]) -> StageOutputs {
        let mut outputs = StageOutputs::new();
        for (stage, text) in entries {
            outputs.insert(StageOutput {
                stage: (*stage).to_string(),
                kind: StageKind::Content,
                response: GenerationResponse::text(*text),
                attempts: 1,
                duration_ms: 0.0,
            });
        }
        outputs
    }

    fn stage(deps: &[&str]) -> Stage {
        Stage::new("refine_plan", Persona::new("r", "g", "b"), "t").with_dependencies(deps.iter().copied())
    }

    #[test]
    fn test_compose_in_declaration_order() {
        let outputs = outputs(&[("evaluate_plan", "Needs numbers"), ("consolidate_plan", "# Plan")]);
        let stage = stage(&["consolidate_plan", "evaluate_plan"]);
        let inputs = StageInputs::collect(&stage, &outputs).unwrap();

        assert_eq!(
            inputs.compose_prompt("Rewrite the plan.\n"),
            "Rewrite the plan.\n\n# Context from earlier stages\n\n## consolidate_plan\n# Plan\n\n## evaluate_plan\nNeeds numbers\n"
        );
    }

    #[test]
    fn test_undeclared_outputs_are_invisible() {
        let outputs = outputs(&[("a", "A"), ("b", "B")]);
        let stage = stage(&["a"]);
        let inputs = StageInputs::collect(&stage, &outputs).unwrap();

        assert_eq!(inputs.get("a"), Some("A"));
        assert_eq!(inputs.get("b"), None);
        assert!(!inputs.compose_prompt("x").contains('B'));
    }

    #[test]
    fn test_missing_dependency_is_not_ready() {
        let outputs = outputs(&[("a", "A")]);
        let stage = stage(&["a", "b"]);

        assert!(matches!(
            StageInputs::collect(&stage, &outputs),
            Err(PipelineError::DependencyNotReady { ref dependency, .. }) if dependency == "b"
        ));
    }

    #[test]
    fn test_no_dependencies_returns_rendered() {
        let outputs = StageOutputs::new();
        let stage = stage(&[]);
        let inputs = StageInputs::collect(&stage, &outputs).unwrap();

        assert!(inputs.is_empty());
        assert_eq!(inputs.compose_prompt("Only this"), "Only this");
    }
}
