//! Client for a running generation server.
//!
//! Used by the `generate` command and by form front ends that post a
//! frozen intake snapshot.

use crate::error::ErrorBody;
use bizplan::delivery::BusinessPlanDocument;
use bizplan::errors::DeliveryError;
use bizplan::intake::IntakeSnapshot;
use bizplan::providers::Credentials;
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by [`PlanClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The endpoint was not set.
    #[error("No generation endpoint configured; pass --endpoint or set BIZPLAN_ENDPOINT")]
    MissingEndpoint,

    /// The request never produced a response.
    #[error("Error connecting to the server: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with an error status.
    #[error("Server returned {status}: {detail}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// The server's `detail` message, or the raw body.
        detail: String,
    },

    /// The response carried no usable plan.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// The intake could not be encoded.
    #[error("Could not encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Posts intake answers to the generation endpoint.
#[derive(Debug, Clone)]
pub struct PlanClient {
    client: Client,
    endpoint: String,
}

impl PlanClient {
    /// Default time allowed for one generation request.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(330);

    /// Creates a client for the full URL of the generate endpoint.
    pub fn new(endpoint: Option<String>) -> Result<Self, ClientError> {
        Self::with_timeout(endpoint, Self::DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(endpoint: Option<String>, timeout: Duration) -> Result<Self, ClientError> {
        let endpoint = endpoint
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .ok_or(ClientError::MissingEndpoint)?;
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, endpoint })
    }

    /// Returns the endpoint URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Posts a prepared body.
    pub async fn generate(&self, body: &Map<String, Value>) -> Result<BusinessPlanDocument, ClientError> {
        tracing::info!(endpoint = %self.endpoint, "Requesting business plan");
        let response = self.client.post(&self.endpoint).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorBody>(&text).map_or(text, |body| body.detail);
            return Err(ClientError::Api { status: status.as_u16(), detail });
        }

        let body: Value = response.json().await?;
        decode_response(&body)
    }

    /// Posts a frozen intake together with provider keys.
    pub async fn generate_intake(
        &self,
        snapshot: &IntakeSnapshot,
        gemini_api_key: Option<&str>,
        groq_api_key: Option<&str>,
    ) -> Result<BusinessPlanDocument, ClientError> {
        let body = request_body(snapshot, gemini_api_key, groq_api_key)?;
        self.generate(&body).await
    }
}

/// Extracts the plan from a generate response body.
///
/// `business_plan` may be the text itself or a structured result with a
/// string `raw` field.
pub fn decode_response(body: &Value) -> Result<BusinessPlanDocument, ClientError> {
    let plan = body
        .get("business_plan")
        .ok_or_else(|| DeliveryError::MalformedResult("response has no 'business_plan' field".into()))?;
    Ok(BusinessPlanDocument::from_json(plan)?)
}

/// Builds a generation request body from an intake snapshot.
///
/// Blank keys are left out.
pub fn request_body(
    snapshot: &IntakeSnapshot,
    gemini_api_key: Option<&str>,
    groq_api_key: Option<&str>,
) -> Result<Map<String, Value>, serde_json::Error> {
    let mut body = match serde_json::to_value(snapshot.record())? {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let credentials = Credentials::new(gemini_api_key, groq_api_key);
    for (field, key) in [("gemini_api_key", &credentials.gemini), ("groq_api_key", &credentials.groq)] {
        if let Some(key) = key {
            body.insert(field.to_string(), Value::String(key.expose().to_string()));
        }
    }
    Ok(body)
}
