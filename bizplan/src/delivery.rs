//! Turning a finished run into what the caller receives.

use crate::errors::DeliveryError;
use crate::providers::GenerationResponse;
use serde::{Deserialize, Serialize};

/// File name offered for download.
pub const DOWNLOAD_FILENAME: &str = "generated_business_plan.md";

/// Media type of the downloadable plan.
pub const MEDIA_TYPE: &str = "text/markdown";

/// The JSON body returned by the generate endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessPlanResponse {
    /// The plan as Markdown.
    pub business_plan: String,
}

/// The final plan text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessPlanDocument {
    body: String,
}

impl BusinessPlanDocument {
    /// Wraps plan text.
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    /// Takes the raw text of a generation response; metadata is dropped.
    ///
    /// # Errors
    ///
    /// Returns `MalformedResult` if the text is blank.
    pub fn from_response(response: &GenerationResponse) -> Result<Self, DeliveryError> {
        if response.raw.trim().is_empty() {
            return Err(DeliveryError::MalformedResult(format!(
                "{} returned an empty plan",
                if response.provider.is_empty() { "provider" } else { response.provider.as_str() }
            )));
        }
        Ok(Self::new(response.raw.clone()))
    }

    /// Extracts plan text from an arbitrary generation result.
    ///
    /// A string is used as is; an object is unwrapped to its string `raw`
    /// field.
    ///
    /// # Errors
    ///
    /// Returns `MalformedResult` for any other shape.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, DeliveryError> {
        match value {
            serde_json::Value::String(text) => Ok(Self::new(text.clone())),
            serde_json::Value::Object(map) => match map.get("raw") {
                Some(serde_json::Value::String(raw)) => Ok(Self::new(raw.clone())),
                Some(other) => Err(DeliveryError::MalformedResult(format!(
                    "'raw' must be a string, got {}",
                    json_kind(other)
                ))),
                None => Err(DeliveryError::MalformedResult("object has no 'raw' field".into())),
            },
            other => Err(DeliveryError::MalformedResult(format!(
                "expected a string or an object, got {}",
                json_kind(other)
            ))),
        }
    }

    /// Returns the Markdown text.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Builds the JSON response body.
    #[must_use]
    pub fn to_response(&self) -> BusinessPlanResponse {
        BusinessPlanResponse { business_plan: self.body.clone() }
    }

    /// Builds the downloadable artifact.
    #[must_use]
    pub fn to_download(&self) -> DownloadArtifact {
        DownloadArtifact {
            filename: DOWNLOAD_FILENAME,
            media_type: MEDIA_TYPE,
            content: self.body.clone(),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// A file ready to be served as an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadArtifact {
    /// Suggested file name.
    pub filename: &'static str,
    /// Media type.
    pub media_type: &'static str,
    /// File content.
    pub content: String,
}

impl DownloadArtifact {
    /// Returns the `Content-Disposition` header value.
    #[must_use]
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }

    /// Returns the `Content-Type` header value.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("{}; charset=utf-8", self.media_type)
    }
}
