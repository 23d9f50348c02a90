//! Error types for the business plan pipeline.
//!
//! Each layer owns a small error enum; [`ServiceError`] is the umbrella the
//! generation service reports to its caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Metadata about a catalog error for better diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ContractErrorInfo {
    /// Error code (e.g., "CATALOG-CYCLE").
    pub code: String,
    /// Short summary of the error.
    pub summary: String,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
    /// Additional context key-value pairs.
    #[serde(default)]
    pub context: HashMap<String, String>,
}

impl ContractErrorInfo {
    /// Creates a new contract error info.
    #[must_use]
    pub fn new(code: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            summary: summary.into(),
            fix_hint: None,
            context: HashMap::new(),
        }
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }

    /// Adds a single context entry.
    #[must_use]
    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// Errors raised while registering or resolving a stage catalog.
///
/// These are programmer errors: the catalog is validated once at startup so
/// none of them can surface in the middle of a run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// The dependency graph contains a cycle.
    #[error("Cycle detected in stage catalog: {}", path.join(" -> "))]
    Cycle {
        /// The stages forming the cycle, first stage repeated at the end.
        path: Vec<String>,
    },

    /// A stage lists a dependency that was never registered.
    #[error("Stage '{stage}' depends on unknown stage '{dependency}'")]
    UnknownDependency {
        /// The stage declaring the dependency.
        stage: String,
        /// The missing dependency.
        dependency: String,
    },

    /// Two stages share a name.
    #[error("Stage '{0}' is already registered")]
    DuplicateStage(String),

    /// A prompt template references a field the intake schema does not know.
    #[error("Stage '{stage}' template references unknown intake field '{placeholder}'")]
    UnknownPlaceholder {
        /// The stage owning the template.
        stage: String,
        /// The unresolved placeholder.
        placeholder: String,
    },

    /// The catalog has no stages.
    #[error("Stage catalog has no stages")]
    Empty,
}

impl CatalogError {
    /// Returns true for the cyclic/unknown dependency family.
    #[must_use]
    pub fn is_dependency_error(&self) -> bool {
        matches!(self, Self::Cycle { .. } | Self::UnknownDependency { .. })
    }

    /// Returns the stages involved in the error.
    #[must_use]
    pub fn stages(&self) -> Vec<String> {
        match self {
            Self::Cycle { path } => path.clone(),
            Self::UnknownDependency { stage, dependency } => vec![stage.clone(), dependency.clone()],
            Self::DuplicateStage(stage) | Self::UnknownPlaceholder { stage, .. } => vec![stage.clone()],
            Self::Empty => Vec::new(),
        }
    }

    /// Returns diagnostic info with a code and a fix hint.
    #[must_use]
    pub fn error_info(&self) -> ContractErrorInfo {
        match self {
            Self::Cycle { path } => ContractErrorInfo::new(
                "CATALOG-CYCLE",
                format!("Stage catalog contains a dependency cycle: {}", path.join(" -> ")),
            )
            .with_fix_hint("Remove one of the dependencies in the cycle to break it."),
            Self::UnknownDependency { stage, dependency } => ContractErrorInfo::new(
                "CATALOG-MISSING_DEP",
                format!("Dependency '{dependency}' not found"),
            )
            .with_fix_hint("Register the dependency or remove it from the stage's depends_on list.")
            .with_context_entry("stage", stage),
            Self::DuplicateStage(stage) => ContractErrorInfo::new(
                "CATALOG-DUPLICATE",
                format!("Stage '{stage}' registered twice"),
            )
            .with_fix_hint("Give every stage a unique name."),
            Self::UnknownPlaceholder { stage, placeholder } => ContractErrorInfo::new(
                "CATALOG-PLACEHOLDER",
                format!("Placeholder '{{{placeholder}}}' is not an intake field"),
            )
            .with_fix_hint("Use an intake field name or remove the placeholder.")
            .with_context_entry("stage", stage),
            Self::Empty => ContractErrorInfo::new("CATALOG-EMPTY", "Cannot resolve an empty catalog")
                .with_fix_hint("Register at least one stage before resolving."),
        }
    }
}

/// Errors returned by a generation capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// The provider rejected the credential.
    #[error("{provider} authentication failed: {message}")]
    Auth {
        /// Provider name.
        provider: String,
        /// Provider message.
        message: String,
    },

    /// The provider throttled the request.
    #[error("{provider} rate limit exceeded: {message}")]
    RateLimited {
        /// Provider name.
        provider: String,
        /// Provider message.
        message: String,
    },

    /// The request did not complete in time.
    #[error("{provider} request timed out")]
    Timeout {
        /// Provider name.
        provider: String,
    },

    /// Connection-level failure.
    #[error("{provider} transport error: {message}")]
    Transport {
        /// Provider name.
        provider: String,
        /// Underlying error text.
        message: String,
    },

    /// Any other non-success status.
    #[error("{provider} returned status {status}: {message}")]
    Upstream {
        /// Provider name.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Response body or message.
        message: String,
    },

    /// The body could not be turned into text.
    #[error("{provider} returned a malformed response: {message}")]
    MalformedResponse {
        /// Provider name.
        provider: String,
        /// What was wrong.
        message: String,
    },
}

impl ProviderError {
    /// Classifies an HTTP status code.
    #[must_use]
    pub fn from_status(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        let provider = provider.into();
        let message = message.into();
        match status {
            401 | 403 => Self::Auth { provider, message },
            429 => Self::RateLimited { provider, message },
            _ => Self::Upstream { provider, status, message },
        }
    }

    /// Returns whether retrying the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Upstream { status, .. } => *status >= 500,
            Self::Auth { .. } | Self::MalformedResponse { .. } => false,
        }
    }

    /// Returns the provider name.
    #[must_use]
    pub fn provider(&self) -> &str {
        match self {
            Self::Auth { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::Timeout { provider }
            | Self::Transport { provider, .. }
            | Self::Upstream { provider, .. }
            | Self::MalformedResponse { provider, .. } => provider,
        }
    }
}

/// Errors raised while executing a pipeline run.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    /// A stage's generation call failed; the run was aborted.
    #[error("Stage '{stage}' failed after {attempts} attempt(s): {source}")]
    StageFailed {
        /// The failing stage.
        stage: String,
        /// Attempts made, including the first.
        attempts: usize,
        /// The provider error of the last attempt.
        source: ProviderError,
    },

    /// No provider is available for the stage.
    #[error("No generation provider configured for stage '{0}'")]
    NoProvider(String),

    /// A stage was scheduled before one of its dependencies produced output.
    #[error("Stage '{stage}' ran before its dependency '{dependency}' produced output")]
    DependencyNotReady {
        /// The stage about to run.
        stage: String,
        /// The dependency without output.
        dependency: String,
    },

    /// A stage expected in the run produced no output.
    #[error("Stage '{0}' produced no output")]
    MissingOutput(String),

    /// The catalog could not be resolved.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

impl PipelineError {
    /// Returns the stage the error originated from, if any.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::StageFailed { stage, .. }
            | Self::NoProvider(stage)
            | Self::DependencyNotReady { stage, .. }
            | Self::MissingOutput(stage) => Some(stage),
            Self::Catalog(_) => None,
        }
    }
}

/// Errors raised while reading or editing intake answers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IntakeError {
    /// A required field is absent.
    #[error("Missing required field '{0}'")]
    MissingField(String),

    /// A field holds a value of the wrong JSON type.
    #[error("Field '{field}' expects {expected}")]
    WrongType {
        /// The field name.
        field: String,
        /// Human-readable expected shape.
        expected: &'static str,
    },

    /// A choice is not among the field's options.
    #[error("'{value}' is not a valid option for '{field}'")]
    InvalidChoice {
        /// The field name.
        field: String,
        /// The rejected value.
        value: String,
    },

    /// A tag set exceeds the field's selection limit.
    #[error("Field '{field}' allows at most {max} selections, got {got}")]
    TooManySelections {
        /// The field name.
        field: String,
        /// The limit.
        max: usize,
        /// The number supplied.
        got: usize,
    },

    /// The field is not part of the schema.
    #[error("Unknown intake field '{0}'")]
    UnknownField(String),
}

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path:?}: {source}")]
    Read {
        /// The file path.
        path: PathBuf,
        /// The IO error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the schema.
    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        /// The file path.
        path: PathBuf,
        /// The TOML error.
        source: toml::de::Error,
    },

    /// A value is present but unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A required value is absent.
    #[error("Missing configuration value: {0}")]
    Missing(String),
}

/// Errors raised by the delivery boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DeliveryError {
    /// The generation result carries no extractable text.
    #[error("Generation result has no raw text: {0}")]
    MalformedResult(String),
}

/// The umbrella error reported by the generation service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// No provider API key was supplied.
    #[error("At least one provider API key (gemini_api_key or groq_api_key) is required")]
    MissingCredential,

    /// The intake answers are incomplete or malformed.
    #[error(transparent)]
    Intake(#[from] IntakeError),

    /// Deployment-level misconfiguration.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// A stage failed or the pipeline was misassembled.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The end-to-end budget elapsed before the run finished.
    #[error("Business plan generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// The final artifact could not be delivered.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),
}
