mod common;

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    Router,
};
use common::FakeBackend;
use invoice_audit_hub::config::AuditConfig;
use invoice_audit_hub::{api, AuditDesk, FallbackSimulator};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

fn app() -> Router {
    let desk = AuditDesk::new(
        Arc::new(FakeBackend::down()),
        FallbackSimulator::with_delays(Duration::from_millis(10), Duration::from_millis(10)),
        &AuditConfig::default(),
    );
    api::router(desk)
}

async fn call(app: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let resp = app
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn health() {
    let app = app();
    let resp = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn refresh_reports_fallback_and_queue_is_searchable() {
    let app = app();

    let (status, body) = call(&app, Method::POST, "/api/queue/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["mode"], "simulated");

    let (status, body) = call(&app, Method::GET, "/api/queue?status=All&search=ACME").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 5);
    assert_eq!(body["refreshing"], false);
    let ids: Vec<_> = body["records"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["invoiceId"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["INV-2024-001", "INV-2024-004"]);
}

#[tokio::test]
async fn unknown_status_filter_is_rejected() {
    let (status, body) = call(&app(), Method::GET, "/api/queue?status=Archived").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn audit_lifecycle_over_http() {
    let app = app();
    call(&app, Method::POST, "/api/queue/refresh").await;

    let (status, _) = call(&app, Method::POST, "/api/invoices/INV-404/audit").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(&app, Method::POST, "/api/invoices/INV-2024-002/audit").await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(body["sessionId"].as_u64().unwrap() > 0);

    let (status, _) = call(&app, Method::POST, "/api/session/approve").await;
    assert_eq!(status, StatusCode::CONFLICT);

    tokio::time::sleep(Duration::from_millis(200)).await;
    let (_, body) = call(&app, Method::GET, "/api/session").await;
    assert_eq!(body["phase"], "Ready");
    assert_eq!(body["finding"]["verdict"], "Matched");

    let (status, body) = call(&app, Method::POST, "/api/session/approve").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Posted");

    let (_, body) = call(&app, Method::GET, "/api/queue?status=Posted").await;
    assert_eq!(body["records"].as_array().unwrap().len(), 1);

    let (status, _) = call(&app, Method::DELETE, "/api/session").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, body) = call(&app, Method::GET, "/api/session").await;
    assert_eq!(body["phase"], "Idle");
}
