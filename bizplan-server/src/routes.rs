//! HTTP routes.

use crate::error::ApiError;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use bizplan::core::StageKind;
use bizplan::delivery::BusinessPlanResponse;
use bizplan::providers::ProviderKind;
use bizplan::service::{GenerateRequest, GenerationService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Path of the generation endpoint.
pub const GENERATE_PATH: &str = "/generate_business_plan";
/// Path of the download endpoint.
pub const DOWNLOAD_PATH: &str = "/generate_business_plan/download";

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    service: Arc<GenerationService>,
}

impl AppState {
    /// Wraps a generation service.
    pub fn new(service: GenerationService) -> Self {
        Self { service: Arc::new(service) }
    }

    /// Returns the service.
    pub fn service(&self) -> &GenerationService {
        &self.service
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/stages", get(stages))
        .route(GENERATE_PATH, post(generate))
        .route(DOWNLOAD_PATH, post(download))
        .with_state(state)
}

/// Health check body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    /// Always `"ok"`.
    pub status: String,
    /// Banner text.
    pub message: String,
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok".into(), message: "Business Plan Generator API is running".into() })
}

/// One entry of the `/stages` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageSummary {
    /// Stage name.
    pub name: String,
    /// Persona role.
    pub role: String,
    /// Stage kind.
    pub kind: StageKind,
    /// Preferred provider.
    pub provider: ProviderKind,
    /// Stages whose output is read.
    pub depends_on: Vec<String>,
}

async fn stages(State(state): State<AppState>) -> Json<Vec<StageSummary>> {
    let stages = state
        .service()
        .pipeline()
        .stages()
        .iter()
        .map(|stage| StageSummary {
            name: stage.name.clone(),
            role: stage.persona.role.clone(),
            kind: stage.kind,
            provider: stage.provider,
            depends_on: stage.depends_on.clone(),
        })
        .collect();
    Json(stages)
}

async fn generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<BusinessPlanResponse>, ApiError> {
    let Json(request) = body?;
    let document = state.service().generate(&request).await?;
    tracing::info!(bytes = document.body().len(), "Business plan generated");
    Ok(Json(document.to_response()))
}

async fn download(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = body?;
    let artifact = state.service().generate(&request).await?.to_download();
    Ok((
        [
            (header::CONTENT_TYPE, artifact.content_type()),
            (header::CONTENT_DISPOSITION, artifact.content_disposition()),
        ],
        artifact.content,
    ))
}
