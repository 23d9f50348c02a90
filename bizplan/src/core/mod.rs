//! Core types shared by the catalog, executor and quality gate.

mod kind;
mod output;

pub use kind::StageKind;
pub use output::{StageOutput, StageOutputs};
