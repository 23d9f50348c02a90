//! Stage outputs accumulated during a run.

use super::StageKind;
use crate::providers::GenerationResponse;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The output of one stage execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutput {
    /// The stage that produced the output.
    pub stage: String,
    /// The stage kind.
    pub kind: StageKind,
    /// The generation result.
    pub response: GenerationResponse,
    /// Generation attempts made, including the first.
    pub attempts: usize,
    /// Wall-clock time spent in the stage.
    pub duration_ms: f64,
}

impl StageOutput {
    /// Returns the produced text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.response.raw
    }
}

/// Stage outputs of one run, in completion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StageOutputs {
    order: Vec<String>,
    by_stage: HashMap<String, StageOutput>,
}

impl StageOutputs {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an output. A later output for the same stage replaces the earlier one.
    pub fn insert(&mut self, output: StageOutput) {
        if !self.by_stage.contains_key(&output.stage) {
            self.order.push(output.stage.clone());
        }
        self.by_stage.insert(output.stage.clone(), output);
    }

    /// Gets the output of a stage.
    #[must_use]
    pub fn get(&self, stage: &str) -> Option<&StageOutput> {
        self.by_stage.get(stage)
    }

    /// Gets the text produced by a stage.
    #[must_use]
    pub fn text(&self, stage: &str) -> Option<&str> {
        self.get(stage).map(StageOutput::text)
    }

    /// Checks whether a stage has produced output.
    #[must_use]
    pub fn contains(&self, stage: &str) -> bool {
        self.by_stage.contains_key(stage)
    }

    /// Returns the number of outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if no stage has produced output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns stage names in completion order.
    #[must_use]
    pub fn stages(&self) -> &[String] {
        &self.order
    }

    /// Iterates outputs in completion order.
    pub fn iter(&self) -> impl Iterator<Item = &StageOutput> {
        self.order.iter().filter_map(|name| self.by_stage.get(name))
    }

    /// Returns the stage name to text mapping.
    #[must_use]
    pub fn to_text_map(&self) -> HashMap<String, String> {
        self.by_stage
            .iter()
            .map(|(name, output)| (name.clone(), output.text().to_string()))
            .collect()
    }
}
