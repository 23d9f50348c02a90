//! Provider selection per stage.

use super::{Credentials, GenerationCapability, ProviderKind};
use crate::errors::ConfigError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// The providers available to one run, keyed by kind.
#[derive(Clone, Default)]
pub struct ProviderSet {
    providers: HashMap<ProviderKind, Arc<dyn GenerationCapability>>,
}

impl ProviderSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A set in which every stage is served by one capability.
    #[must_use]
    pub fn single(capability: Arc<dyn GenerationCapability>) -> Self {
        Self::new()
            .with_provider(ProviderKind::Gemini, Arc::clone(&capability))
            .with_provider(ProviderKind::Groq, capability)
    }

    /// Adds or replaces a provider.
    #[must_use]
    pub fn with_provider(mut self, kind: ProviderKind, capability: Arc<dyn GenerationCapability>) -> Self {
        self.providers.insert(kind, capability);
        self
    }

    /// Picks the preferred provider, falling back to the other one.
    #[must_use]
    pub fn route(&self, preferred: ProviderKind) -> Option<(ProviderKind, Arc<dyn GenerationCapability>)> {
        [preferred, preferred.other()]
            .into_iter()
            .find_map(|kind| self.providers.get(&kind).map(|p| (kind, Arc::clone(p))))
    }

    /// Returns true if no provider is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Returns the configured kinds.
    #[must_use]
    pub fn kinds(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.providers.keys().copied().collect();
        kinds.sort_by_key(|k| k.as_str());
        kinds
    }
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSet").field("kinds", &self.kinds()).finish()
    }
}

/// Builds the providers for one run from its credentials.
pub trait ProviderFactory: Send + Sync {
    /// Creates a provider for each supplied key.
    fn build(&self, credentials: &Credentials) -> Result<ProviderSet, ConfigError>;
}

/// Builds reqwest-backed Gemini and Groq clients.
#[cfg(feature = "http-providers")]
#[derive(Debug, Clone)]
pub struct HttpProviderFactory {
    config: crate::config::ProvidersConfig,
}

#[cfg(feature = "http-providers")]
impl HttpProviderFactory {
    /// Creates a factory from provider settings.
    #[must_use]
    pub fn new(config: crate::config::ProvidersConfig) -> Self {
        Self { config }
    }
}

#[cfg(feature = "http-providers")]
impl ProviderFactory for HttpProviderFactory {
    fn build(&self, credentials: &Credentials) -> Result<ProviderSet, ConfigError> {
        let mut set = ProviderSet::new();
        if let Some(key) = &credentials.gemini {
            let provider = super::GeminiProvider::new(key.clone(), &self.config.gemini)?;
            set = set.with_provider(ProviderKind::Gemini, Arc::new(provider));
        }
        if let Some(key) = &credentials.groq {
            let provider = super::GroqProvider::new(key.clone(), &self.config.groq)?;
            set = set.with_provider(ProviderKind::Groq, Arc::new(provider));
        }
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::DeterministicGenerator;

    #[test]
    fn test_route_prefers_then_falls_back() {
        let set = ProviderSet::new()
            .with_provider(ProviderKind::Groq, Arc::new(DeterministicGenerator::new()));

        let (kind, _) = set.route(ProviderKind::Groq).unwrap();
        assert_eq!(kind, ProviderKind::Groq);

        let (kind, _) = set.route(ProviderKind::Gemini).unwrap();
        assert_eq!(kind, ProviderKind::Groq);
    }

    #[test]
    fn test_empty_set_routes_nothing() {
        let set = ProviderSet::new();
        assert!(set.is_empty());
        assert!(set.route(ProviderKind::Gemini).is_none());
    }

    #[test]
    fn test_single_serves_both() {
        let set = ProviderSet::single(Arc::new(DeterministicGenerator::new()));
        assert_eq!(set.kinds(), vec![ProviderKind::Gemini, ProviderKind::Groq]);
    }

    #[cfg(feature = "http-providers")]
    #[test]
    fn test_http_factory_builds_supplied_keys_only() {
        let factory = HttpProviderFactory::new(crate::config::ProvidersConfig::default());
        let set = factory.build(&Credentials::new(None, Some("gsk"))).unwrap();

        assert_eq!(set.kinds(), vec![ProviderKind::Groq]);
    }
}
