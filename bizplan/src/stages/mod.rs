//! Stages and the stage catalog.
//!
//! A [`Stage`] pairs a persona with a prompt template and names the stages
//! whose output it reads. The [`StageCatalog`] registers stages and resolves
//! a dependency-respecting execution order.

pub mod business_plan;
mod catalog;
mod persona;
mod template;

pub use catalog::StageCatalog;
pub use persona::Persona;
pub use template::PromptTemplate;

use crate::core::StageKind;
use crate::providers::ProviderKind;
use serde::Serialize;

/// One generation step of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    /// Unique stage name.
    pub name: String,
    /// Who the model acts as.
    pub persona: Persona,
    /// The prompt over intake fields.
    pub template: PromptTemplate,
    /// Stages whose output this stage reads, in declaration order.
    pub depends_on: Vec<String>,
    /// The role of the stage.
    pub kind: StageKind,
    /// The provider tried first.
    pub provider: ProviderKind,
}

impl Stage {
    /// Creates a content stage with no dependencies served by Gemini.
    #[must_use]
    pub fn new(name: impl Into<String>, persona: Persona, template: impl Into<PromptTemplate>) -> Self {
        Self {
            name: name.into(),
            persona,
            template: template.into(),
            depends_on: Vec::new(),
            kind: StageKind::Content,
            provider: ProviderKind::Gemini,
        }
    }

    /// Adds a dependency; repeats are ignored.
    #[must_use]
    pub fn with_dependency(mut self, dependency: impl Into<String>) -> Self {
        let dependency = dependency.into();
        if !self.depends_on.contains(&dependency) {
            self.depends_on.push(dependency);
        }
        self
    }

    /// Adds several dependencies in order.
    #[must_use]
    pub fn with_dependencies<I, S>(self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        dependencies.into_iter().fold(self, Self::with_dependency)
    }

    /// Sets the stage kind.
    #[must_use]
    pub fn with_kind(mut self, kind: StageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the preferred provider.
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderKind) -> Self {
        self.provider = provider;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_builder() {
        let stage = Stage::new("evaluate_plan", Persona::new("Evaluator", "g", "b"), "Review it")
            .with_dependencies(["consolidate_plan", "consolidate_plan"])
            .with_kind(StageKind::Evaluate)
            .with_provider(ProviderKind::Groq);

        assert_eq!(stage.depends_on, vec!["consolidate_plan".to_string()]);
        assert_eq!(stage.kind, StageKind::Evaluate);
        assert_eq!(stage.provider, ProviderKind::Groq);
        assert_eq!(stage.template.source(), "Review it");
    }
}
