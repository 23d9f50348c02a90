//! End-to-end tests of the HTTP boundary with stub providers.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bizplan::intake::IntakeSchema;
use bizplan::pipeline::BusinessPlanPipeline;
use bizplan::providers::GenerationCapability;
use bizplan::service::GenerationService;
use bizplan::stages::business_plan;
use bizplan::testing::{eco_fashion_body, FailingGenerator, RecordingGenerator, ScriptedGenerator, StaticProviderFactory};
use bizplan_server::{router, AppState, ErrorBody};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const FINAL_PLAN: &str = "# EcoFashion Business Plan\n\n## Executive Summary\nSustainable clothing from recycled ocean plastics.\n";

fn app_with(capability: Arc<dyn GenerationCapability>) -> Router {
    let service = GenerationService::new(
        IntakeSchema::business_plan(),
        BusinessPlanPipeline::business_plan().unwrap(),
        Arc::new(StaticProviderFactory::new(capability)),
    );
    router(AppState::new(service))
}

fn scripted() -> ScriptedGenerator {
    ScriptedGenerator::new("section")
        .with_response(business_plan::EVALUATE_PLAN, "Add a cash-flow table.\nScore: 7/10\nVerdict: PASS")
        .with_response(business_plan::REFINE_PLAN, FINAL_PLAN)
}

fn eco_fashion_request(gemini: Option<&str>, groq: Option<&str>) -> Value {
    let mut body = eco_fashion_body();
    if let Some(key) = gemini {
        body.insert("gemini_api_key".into(), json!(key));
    }
    if let Some(key) = groq {
        body.insert("groq_api_key".into(), json!(key));
    }
    Value::Object(body)
}

fn post(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = app_with(Arc::new(scripted()));
    let response = app.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body, json!({"status": "ok", "message": "Business Plan Generator API is running"}));
}

#[tokio::test]
async fn test_eco_fashion_generates_refined_plan() {
    let recorder = Arc::new(RecordingGenerator::new(scripted()));
    let app = app_with(recorder.clone());

    let response = app
        .oneshot(post("/generate_business_plan", &eco_fashion_request(Some("AIza-test"), Some("gsk-test"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body, json!({"business_plan": FINAL_PLAN}));

    let stages = recorder.stages();
    assert_eq!(stages.len(), 9);
    assert_eq!(stages.last().map(String::as_str), Some(business_plan::REFINE_PLAN));

    let refine = recorder.request_for(business_plan::REFINE_PLAN).unwrap();
    assert!(refine.prompt.contains("section for consolidate_plan"));
    assert!(refine.prompt.contains("Verdict: PASS"));
}

#[tokio::test]
async fn test_eco_fashion_download() {
    let app = app_with(Arc::new(scripted()));

    let response = app
        .oneshot(post("/generate_business_plan/download", &eco_fashion_request(Some("AIza-test"), None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "text/markdown; charset=utf-8");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"generated_business_plan.md\""
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), FINAL_PLAN);
}

#[tokio::test]
async fn test_missing_credentials_is_bad_request() {
    let recorder = Arc::new(RecordingGenerator::new(scripted()));
    let app = app_with(recorder.clone());

    let response = app
        .oneshot(post("/generate_business_plan", &eco_fashion_request(Some(""), None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = read_json(response).await;
    assert!(body.detail.contains("API key"));
    assert!(recorder.is_empty());
}

#[tokio::test]
async fn test_missing_field_is_unprocessable() {
    let app = app_with(Arc::new(scripted()));
    let mut request = eco_fashion_request(Some("AIza-test"), None);
    request.as_object_mut().unwrap().remove("team_members");

    let response = app.oneshot(post("/generate_business_plan", &request)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorBody = read_json(response).await;
    assert!(body.detail.contains("team_members"));
}

#[tokio::test]
async fn test_wrong_type_is_unprocessable() {
    let app = app_with(Arc::new(scripted()));
    let mut request = eco_fashion_request(Some("AIza-test"), None);
    request["partnership_benefits"] = json!("Reducing risk");

    let response = app.oneshot(post("/generate_business_plan", &request)).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_json_has_detail() {
    let app = app_with(Arc::new(scripted()));
    let request = Request::builder()
        .method("POST")
        .uri("/generate_business_plan")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = read_json(response).await;
    assert!(!body.detail.is_empty());
}

#[tokio::test]
async fn test_stage_failure_names_stage() {
    let app = app_with(Arc::new(FailingGenerator::on_stage(business_plan::CONSOLIDATE_PLAN)));

    let response = app
        .oneshot(post("/generate_business_plan", &eco_fashion_request(Some("AIza-test"), None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = read_json(response).await;
    assert!(body.detail.contains("consolidate_plan"));
}

#[tokio::test]
async fn test_stages_listing() {
    let app = app_with(Arc::new(scripted()));
    let response = app.oneshot(Request::builder().uri("/stages").body(Body::empty()).unwrap()).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let stages: Vec<Value> = read_json(response).await;
    assert_eq!(stages.len(), 9);
    assert_eq!(stages[0]["name"], "create_business_concept");
    assert_eq!(stages[8]["name"], "refine_plan");
    assert_eq!(stages[8]["depends_on"], json!(["consolidate_plan", "evaluate_plan"]));
    assert_eq!(stages[8]["provider"], "groq");
}
