//! Stage kind enum.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role a stage plays in producing the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Writes one section of the plan.
    #[default]
    Content,
    /// Merges earlier sections into one document.
    Consolidate,
    /// Reviews the consolidated document against a rubric.
    Evaluate,
    /// Rewrites the consolidated document using the review.
    Refine,
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content => write!(f, "content"),
            Self::Consolidate => write!(f, "consolidate"),
            Self::Evaluate => write!(f, "evaluate"),
            Self::Refine => write!(f, "refine"),
        }
    }
}

impl StageKind {
    /// Returns true for the quality gate stages.
    #[must_use]
    pub fn is_gate(&self) -> bool {
        matches!(self, Self::Evaluate | Self::Refine)
    }
}
