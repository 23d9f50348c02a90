//! Pipeline execution: per-stage inputs, retry, the executor and full runs.

mod executor;
mod inputs;
mod retry;
mod run;

pub use executor::PipelineExecutor;
pub use inputs::{StageInputs, CONTEXT_HEADING};
pub use retry::{BackoffStrategy, JitterStrategy, RetryPolicy};
pub use run::{BusinessPlanPipeline, PipelineRun};
