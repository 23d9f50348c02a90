//! # Bizplan
//!
//! Turns a structured business intake into a business plan by running a
//! dependency-ordered sequence of LLM stages.
//!
//! - **Intake**: a schema-validated record of the founder's answers, frozen
//!   into a snapshot before generation
//! - **Stage catalog**: personas and prompt templates with declared
//!   dependencies, resolved once into a deterministic order
//! - **Quality gate**: an evaluate stage followed by a refine stage
//! - **Delivery**: the refined plan as JSON or a Markdown download
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bizplan::prelude::*;
//!
//! let pipeline = BusinessPlanPipeline::business_plan()?;
//! let providers = HttpProviderFactory::new(ProvidersConfig::default())
//!     .build(&Credentials::new(Some(&gemini_key), Some(&groq_key)))?;
//! let run = pipeline.run(providers, snapshot).await?;
//! println!("{}", run.final_text());
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, missing_docs, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod core;
pub mod delivery;
pub mod errors;
pub mod events;
pub mod gate;
pub mod intake;
pub mod observability;
pub mod pipeline;
pub mod providers;
pub mod service;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{AppConfig, LoggingConfig, PipelineConfig, ProviderConfig, ProvidersConfig};
    pub use crate::core::{StageKind, StageOutput, StageOutputs};
    pub use crate::delivery::{BusinessPlanDocument, BusinessPlanResponse, DownloadArtifact};
    pub use crate::errors::{
        CatalogError, ConfigError, DeliveryError, IntakeError, PipelineError, ProviderError, ServiceError,
    };
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::gate::{EvaluationResult, QualityGate, Verdict};
    pub use crate::intake::{IntakeBuilder, IntakeRecord, IntakeSchema, IntakeSnapshot, IntakeValue, Section};
    pub use crate::pipeline::{BusinessPlanPipeline, PipelineExecutor, PipelineRun, RetryPolicy};
    #[cfg(feature = "http-providers")]
    pub use crate::providers::HttpProviderFactory;
    pub use crate::providers::{
        Credentials, GenerationCapability, GenerationRequest, GenerationResponse, ProviderFactory, ProviderKind,
        ProviderSet,
    };
    pub use crate::service::{GenerateRequest, GenerationService};
    pub use crate::stages::{Persona, PromptTemplate, Stage, StageCatalog};
}
