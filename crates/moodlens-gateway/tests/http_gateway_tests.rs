//! HTTP gateway tests against a throwaway local provider

use axum::{
    extract::Json,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Router,
};
use moodlens_domain::traits::InferenceGateway;
use moodlens_domain::{OperationKind, UpstreamBody};
use moodlens_gateway::{HttpGateway, ProviderEndpoint};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::net::TcpListener;

/// Echo the request body and the authorization header back as JSON
async fn echo(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({"received": body, "authorization": auth}))
}

async fn unavailable() -> impl IntoResponse {
    (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable")
}

async fn broken() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [("content-type", "application/json")],
        r#"{"detail": "oops", "code": 7}"#,
    )
}

async fn loading() -> impl IntoResponse {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": "Model is currently loading", "estimated_time": 20.0})),
    )
}

/// Start a local provider and return its base URL
async fn start_provider() -> String {
    let app = Router::new()
        .route("/echo", post(echo))
        .route("/unavailable", post(unavailable))
        .route("/loading", post(loading))
        .route("/broken", post(broken));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

fn gateway_for(kind: OperationKind, endpoint: ProviderEndpoint) -> HttpGateway {
    let mut endpoints = HashMap::new();
    endpoints.insert(kind, endpoint);
    HttpGateway::new(endpoints, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_sends_inputs_and_bearer_token() {
    let base = start_provider().await;
    let gateway = gateway_for(
        OperationKind::MoodAnalysis,
        ProviderEndpoint::new(format!("{}/echo", base)),
    )
    .with_api_key(Some("hf_test".to_string()));

    let raw = gateway
        .infer(OperationKind::MoodAnalysis, "I feel great")
        .await
        .unwrap();

    assert_eq!(raw.status_code, 200);
    assert_eq!(
        raw.body,
        UpstreamBody::Json(json!({
            "received": {"inputs": "I feel great"},
            "authorization": "Bearer hf_test"
        }))
    );
}

#[tokio::test]
async fn test_sends_parameters_without_token() {
    let base = start_provider().await;
    let gateway = gateway_for(
        OperationKind::CrisisDetection,
        ProviderEndpoint::new(format!("{}/echo", base))
            .with_parameters(json!({"candidate_labels": ["crisis", "support", "neutral"]})),
    );

    let raw = gateway
        .infer(OperationKind::CrisisDetection, "help")
        .await
        .unwrap();

    assert_eq!(
        raw.body,
        UpstreamBody::Json(json!({
            "received": {
                "inputs": "help",
                "parameters": {"candidate_labels": ["crisis", "support", "neutral"]}
            },
            "authorization": null
        }))
    );
}

#[tokio::test]
async fn test_error_status_returned_untouched() {
    let base = start_provider().await;
    let gateway = gateway_for(
        OperationKind::Summarization,
        ProviderEndpoint::new(format!("{}/unavailable", base)),
    )
    .with_max_attempts(3);

    let raw = gateway
        .infer(OperationKind::Summarization, "text")
        .await
        .unwrap();

    assert_eq!(raw.status_code, 503);
    assert!(!raw.is_json());
    assert_eq!(raw.body, UpstreamBody::Text("Service Unavailable".to_string()));
}

#[tokio::test]
async fn test_error_json_body_parsed() {
    let base = start_provider().await;
    let gateway = gateway_for(
        OperationKind::MoodAnalysis,
        ProviderEndpoint::new(format!("{}/loading", base)),
    );

    let raw = gateway
        .infer(OperationKind::MoodAnalysis, "text")
        .await
        .unwrap();

    assert_eq!(raw.status_code, 503);
    assert!(raw.is_json());
}

#[tokio::test]
async fn test_error_body_text_kept_as_received() {
    let base = start_provider().await;
    let gateway = gateway_for(
        OperationKind::MoodAnalysis,
        ProviderEndpoint::new(format!("{}/broken", base)),
    );

    let raw = gateway
        .infer(OperationKind::MoodAnalysis, "text")
        .await
        .unwrap();

    assert_eq!(raw.status_code, 500);
    assert!(raw.is_json());
    assert_eq!(raw.body_text(), r#"{"detail": "oops", "code": 7}"#);
}
