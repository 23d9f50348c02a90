//! Application configuration.
//!
//! Settings come from an optional TOML file; every key has a default so an
//! empty file is valid. API keys are per-request values and never live here.

use crate::errors::ConfigError;
use crate::pipeline::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// `[server]` section.
    #[serde(default)]
    pub server: ServerConfig,
    /// `[pipeline]` section.
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// `[providers.*]` sections.
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// `[logging]` section.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Loads and validates configuration. `None` yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails
    /// validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load_from(path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let config: Self = toml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Checks values that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::Invalid("server.host must not be empty".into()));
        }
        if self.pipeline.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("pipeline.request_timeout_secs must be positive".into()));
        }
        if !(0.0..=2.0).contains(&self.pipeline.temperature) {
            return Err(ConfigError::Invalid(format!(
                "pipeline.temperature must be within [0, 2], got {}",
                self.pipeline.temperature
            )));
        }
        if self.pipeline.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("pipeline.retry.max_attempts must be at least 1".into()));
        }
        self.providers.gemini.validate("gemini")?;
        self.providers.groq.validate("groq")?;
        Ok(())
    }
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    8000
}

/// `[pipeline]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// End-to-end budget for one generation request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Sampling temperature for every stage.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// `[pipeline.retry]`; a single attempt unless configured.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            temperature: default_temperature(),
            retry: RetryPolicy::default(),
        }
    }
}

impl PipelineConfig {
    /// Returns the end-to-end budget.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_request_timeout_secs() -> u64 {
    300
}
fn default_temperature() -> f32 {
    0.1
}

/// Settings for one upstream provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Model identifier.
    pub model: String,
    /// API root, without a trailing path.
    pub base_url: String,
    /// Output token cap sent with each call.
    pub max_output_tokens: Option<u32>,
    /// Per-call HTTP timeout.
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    /// Gemini defaults.
    #[must_use]
    pub fn gemini() -> Self {
        Self {
            model: "gemini-2.5-pro-preview-05-06".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            max_output_tokens: Some(8192),
            request_timeout_secs: 180,
        }
    }

    /// Groq defaults.
    #[must_use]
    pub fn groq() -> Self {
        Self {
            model: "llama-3.3-70b-versatile".into(),
            base_url: "https://api.groq.com/openai/v1".into(),
            max_output_tokens: Some(8192),
            request_timeout_secs: 120,
        }
    }

    fn validate(&self, name: &str) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid(format!("providers.{name}.model must not be empty")));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "providers.{name}.base_url must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(format!(
                "providers.{name}.request_timeout_secs must be positive"
            )));
        }
        Ok(())
    }
}

/// `[providers.gemini]` and `[providers.groq]`.
///
/// Keys left out of the file keep the provider's own defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ProvidersFile")]
pub struct ProvidersConfig {
    /// Gemini settings.
    pub gemini: ProviderConfig,
    /// Groq settings.
    pub groq: ProviderConfig,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self { gemini: ProviderConfig::gemini(), groq: ProviderConfig::groq() }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ProvidersFile {
    #[serde(default)]
    gemini: ProviderOverrides,
    #[serde(default)]
    groq: ProviderOverrides,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderOverrides {
    model: Option<String>,
    base_url: Option<String>,
    max_output_tokens: Option<u32>,
    request_timeout_secs: Option<u64>,
}

impl ProviderOverrides {
    fn apply(self, mut base: ProviderConfig) -> ProviderConfig {
        if let Some(model) = self.model {
            base.model = model;
        }
        if let Some(url) = self.base_url {
            base.base_url = url;
        }
        if self.max_output_tokens.is_some() {
            base.max_output_tokens = self.max_output_tokens;
        }
        if let Some(secs) = self.request_timeout_secs {
            base.request_timeout_secs = secs;
        }
        base
    }
}

impl From<ProvidersFile> for ProvidersConfig {
    fn from(file: ProvidersFile) -> Self {
        Self {
            gemini: file.gemini.apply(ProviderConfig::gemini()),
            groq: file.groq.apply(ProviderConfig::groq()),
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { json: false, filter: default_filter() }
    }
}

fn default_filter() -> String {
    "info".into()
}
