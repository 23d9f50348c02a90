//! Per-run provider credentials.

use super::ProviderKind;
use std::fmt;

/// An API key that never appears in debug output.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a key; blank input yields `None`.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = key.into().trim().to_string();
        (!key.is_empty()).then_some(Self(key))
    }

    /// Returns the secret.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// The keys supplied with one generation request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Gemini key.
    pub gemini: Option<ApiKey>,
    /// Groq key.
    pub groq: Option<ApiKey>,
}

impl Credentials {
    /// Builds credentials from optional raw keys.
    #[must_use]
    pub fn new(gemini: Option<&str>, groq: Option<&str>) -> Self {
        Self {
            gemini: gemini.and_then(ApiKey::new),
            groq: groq.and_then(ApiKey::new),
        }
    }

    /// Returns the key for a provider.
    #[must_use]
    pub fn get(&self, kind: ProviderKind) -> Option<&ApiKey> {
        match kind {
            ProviderKind::Gemini => self.gemini.as_ref(),
            ProviderKind::Groq => self.groq.as_ref(),
        }
    }

    /// Returns true if no key was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.gemini.is_none() && self.groq.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_keys_are_absent() {
        let credentials = Credentials::new(Some("   "), None);
        assert!(credentials.is_empty());
    }

    #[test]
    fn test_key_is_trimmed_and_redacted() {
        let credentials = Credentials::new(None, Some(" gsk-123 "));

        assert_eq!(credentials.get(ProviderKind::Groq).unwrap().expose(), "gsk-123");
        assert!(credentials.get(ProviderKind::Gemini).is_none());
        assert!(!format!("{credentials:?}").contains("gsk-123"));
    }
}
