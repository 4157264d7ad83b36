//! HTTP round trips through the router, without a listening socket.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use flix_api::{create_app, AppState, Metrics};
use flix_generator::{GeneratorConfig, TemplateBuilder};

const SCRIPT: &str = "import \"FlowToken\"\n\naccess(all) fun main(): UFix64 {\n    return FlowToken.totalSupply\n}\n";

fn app() -> axum::Router {
    let state = AppState {
        builder: TemplateBuilder::from_config(GeneratorConfig::default()),
        metrics: Metrics::new().unwrap(),
    };
    create_app(Arc::new(state))
}

async fn call(app: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        })
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn call_json(app: axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let (status, bytes) = call(app, method, uri, body).await;
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let (status, body) = call_json(app(), "GET", "/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_registry_listing() {
    let (status, body) = call_json(app(), "GET", "/v1/registry/contracts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contracts"]["FlowToken"]["mainnet"], "0x1654653399040a61");
}

#[tokio::test]
async fn test_generate_then_verify() {
    let app = app();
    let (status, template) = call_json(
        app.clone(),
        "POST",
        "/v1/templates/generate",
        Some(json!({ "code": SCRIPT })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(template["f_version"], "1.1.0");
    assert_eq!(template["data"]["type"], "script");
    assert_eq!(template["data"]["cadence"]["network_pins"].as_array().unwrap().len(), 2);

    let (status, report) = call_json(
        app.clone(),
        "POST",
        "/v1/templates/verify",
        Some(json!({ "template": template.clone() })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["valid"], true);

    let mut tampered = template.clone();
    tampered["data"]["cadence"]["body"] = json!("access(all) fun main() {}");
    let (_, report) = call_json(app.clone(), "POST", "/v1/templates/verify", Some(json!({ "template": tampered }))).await;
    assert_eq!(report["id_valid"], false);
    assert_eq!(report["valid"], false);

    let (status, source) = call_json(
        app.clone(),
        "POST",
        "/v1/templates/source",
        Some(json!({ "template": template, "network": "testnet" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(source["source"]
        .as_str()
        .unwrap()
        .starts_with("import FlowToken from 0x7e60df042a9c0868"));

    let (status, text) = call(app, "GET", "/metrics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8(text).unwrap().contains("flix_builds_total{outcome=\"ok\"} 1"));
}

#[tokio::test]
async fn test_unresolved_import_is_unprocessable() {
    let code = "import \"Nowhere\"\naccess(all) fun main() {}";
    let (status, body) = call_json(app(), "POST", "/v1/templates/generate", Some(json!({ "code": code }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().starts_with("RESOLVE/"));
}

#[tokio::test]
async fn test_unknown_template_version() {
    let template = json!({ "f_type": "InteractionTemplate", "f_version": "9.9.9", "data": {} });
    let (status, body) = call_json(app(), "POST", "/v1/templates/verify", Some(json!({ "template": template }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("9.9.9"));
}
