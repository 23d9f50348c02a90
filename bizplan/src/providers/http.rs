//! Shared HTTP plumbing for provider clients.

use crate::config::ProviderConfig;
use crate::errors::{ConfigError, ProviderError};
use reqwest::Client;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn build_client(config: &ProviderConfig) -> Result<Client, ConfigError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| ConfigError::Invalid(format!("failed to create HTTP client: {e}")))
}

pub(crate) fn map_transport_error(provider: &str, error: &reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::Timeout { provider: provider.to_string() }
    } else if let Some(status) = error.status() {
        ProviderError::from_status(provider, status.as_u16(), error.to_string())
    } else if error.is_decode() {
        ProviderError::MalformedResponse {
            provider: provider.to_string(),
            message: error.to_string(),
        }
    } else {
        ProviderError::Transport {
            provider: provider.to_string(),
            message: error.to_string(),
        }
    }
}

/// Turns a non-success response into a classified error, keeping the body.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::from_status(provider, status.as_u16(), body))
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_slashes() {
        assert_eq!(
            endpoint("https://api.groq.com/openai/v1/", "/chat/completions"),
            "https://api.groq.com/openai/v1/chat/completions"
        );
        assert_eq!(endpoint("http://localhost", "x"), "http://localhost/x");
    }
}
