//! Pipeline lifecycle events.
//!
//! The executor reports progress through an [`EventSink`]. Event names are
//! dotted strings; payloads are JSON objects carrying at least the run id.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// A run began.
pub const PIPELINE_STARTED: &str = "pipeline.started";
/// A run finished with every stage complete.
pub const PIPELINE_COMPLETED: &str = "pipeline.completed";
/// A run was aborted.
pub const PIPELINE_FAILED: &str = "pipeline.failed";
/// A stage is about to call its provider.
pub const STAGE_STARTED: &str = "stage.started";
/// A stage produced output.
pub const STAGE_COMPLETED: &str = "stage.completed";
/// A stage failed.
pub const STAGE_FAILED: &str = "stage.failed";
