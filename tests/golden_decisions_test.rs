//! Golden decision tests.
//!
//! Each case in `tests/fixtures/golden_cases.json` is posted to the reprice
//! endpoint and the resulting decisions are compared field by field.

use axum::http::StatusCode;
use repricer::api::{self, AppState};
use repricer::config::Config;
use serde_json::Value;
use tower::util::ServiceExt;

fn load_fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("missing fixture {}: {}", path, e))
}

async fn post_reprice(app: axum::Router, body: &Value) -> (StatusCode, Value) {
    let req = axum::http::Request::builder()
        .method("POST")
        .uri("/v1/reprice")
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn summarize(decision: &Value) -> Value {
    serde_json::json!({
        "vendorId": decision["vendorId"],
        "minQty": decision["minQty"],
        "category": decision["category"],
        "suggestedPrice": decision["suggestedPrice"],
        "tags": decision["tags"],
    })
}

#[tokio::test]
async fn test_golden_cases() {
    let cases: Vec<Value> = serde_json::from_str(&load_fixture("golden_cases.json")).unwrap();
    assert!(!cases.is_empty());

    let app = api::create_router(AppState::new(Config::default()));

    for case in &cases {
        let name = case["name"].as_str().unwrap();
        let (status, body) = post_reprice(app.clone(), &case["request"]).await;
        assert_eq!(status, StatusCode::OK, "case {}", name);

        let actual: Vec<Value> = body["decisions"]
            .as_array()
            .unwrap()
            .iter()
            .map(summarize)
            .collect();
        let expected: Vec<Value> = case["expected"].as_array().unwrap().clone();

        assert_eq!(
            serde_json::to_string_pretty(&actual).unwrap(),
            serde_json::to_string_pretty(&expected).unwrap(),
            "case {} must match golden decisions",
            name
        );
    }
}

#[tokio::test]
async fn test_golden_cases_are_deterministic() {
    let cases: Vec<Value> = serde_json::from_str(&load_fixture("golden_cases.json")).unwrap();
    let app = api::create_router(AppState::new(Config::default()));

    for case in &cases {
        let mut request = case["request"].clone();
        request["evaluatedAt"] = Value::String("2024-03-01T12:00:00Z".to_string());

        let (_, first) = post_reprice(app.clone(), &request).await;
        let (_, second) = post_reprice(app.clone(), &request).await;

        assert_ne!(first["runId"], second["runId"]);
        assert_eq!(
            serde_json::to_string(&first["decisions"]).unwrap(),
            serde_json::to_string(&second["decisions"]).unwrap(),
            "case {} must produce identical decisions",
            case["name"]
        );
        assert_eq!(first["reconciliations"], second["reconciliations"]);
    }
}

#[tokio::test]
async fn test_explanations_carry_context_url() {
    let cases: Vec<Value> = serde_json::from_str(&load_fixture("golden_cases.json")).unwrap();
    let app = api::create_router(AppState::new(Config::default()));

    let (_, body) = post_reprice(app, &cases[0]["request"]).await;
    let explanation = body["decisions"][0]["explanation"].as_str().unwrap();
    assert!(explanation.starts_with("CHANGE_DOWN: 12.00 -> 9.99"));
    assert!(explanation.ends_with("ctx=https://www.net32.com/mp/1001"));
}
