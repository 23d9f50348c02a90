//! Prompt templates with `{field}` placeholders.

use crate::intake::IntakeRecord;
use regex::{Captures, Regex};
use serde::{Serialize, Serializer};
use std::sync::OnceLock;

#[allow(clippy::expect_used)]
fn placeholder_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{([a-z][a-z0-9_]*)\}").expect("placeholder regex"))
}

/// A prompt with `{field_name}` placeholders over intake fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    /// Creates a template.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self { source: source.into() }
    }

    /// Returns the raw template text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns distinct placeholder names in first-appearance order.
    #[must_use]
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for caps in placeholder_re().captures_iter(&self.source) {
            if let Some(name) = caps.get(1).map(|m| m.as_str()) {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Substitutes every placeholder from the record. Absent fields render empty.
    #[must_use]
    pub fn render(&self, record: &IntakeRecord) -> String {
        placeholder_re()
            .replace_all(&self.source, |caps: &Captures<'_>| record.render(&caps[1]))
            .into_owned()
    }
}

impl Serialize for PromptTemplate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.source)
    }
}

impl From<&str> for PromptTemplate {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}
