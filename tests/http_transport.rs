//! JSON-RPC over `POST /mcp`.

mod common;

use std::sync::Arc;

use common::{state_with, FakeEngine};
use pipelex_mcp_server::http_transport::build_router;
use serde_json::{json, Value};

async fn spawn_server(engine: Arc<FakeEngine>, root: &std::path::Path) -> String {
    let state = state_with(engine, root);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_router(state)).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn list_pipes_over_http() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = Arc::new(FakeEngine::default());
    let base = spawn_server(engine.clone(), tmp.path()).await;
    let client = reqwest::Client::new();

    let resp: Value = client
        .post(format!("{base}/mcp"))
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": "list_available_pipes", "arguments": {} }
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let text = resp["result"]["content"][0]["text"].as_str().unwrap();
    let listing: Value = serde_json::from_str(text).unwrap();
    assert!(listing["docs"]["classify"].is_object());
    assert_eq!(engine.calls(), vec!["list_pipes"]);
}

#[tokio::test]
async fn notifications_are_accepted_without_body() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_server(Arc::new(FakeEngine::default()), tmp.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/mcp"))
        .json(&json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 202);
}

#[tokio::test]
async fn invalid_json_is_a_parse_error() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_server(Arc::new(FakeEngine::default()), tmp.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("{base}/mcp"))
        .body("{nope")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32700);
}

#[tokio::test]
async fn health_route() {
    let tmp = tempfile::tempdir().unwrap();
    let base = spawn_server(Arc::new(FakeEngine::default()), tmp.path()).await;

    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "status": "ok", "server": "pipelex" }));
}

#[tokio::test]
async fn large_payloads_are_accepted() {
    let tmp = tempfile::tempdir().unwrap();
    let engine = Arc::new(FakeEngine::default());
    let base = spawn_server(engine.clone(), tmp.path()).await;

    let plx_content = format!("{}# {}\n", common::PLX, "x".repeat(3 * 1024 * 1024));
    let resp = reqwest::Client::new()
        .post(format!("{base}/mcp"))
        .json(&json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/call",
            "params": { "name": "validate_pipeline", "arguments": { "plx_content": plx_content } }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 200);

    let body: Value = resp.json().await.unwrap();
    assert!(body["result"]["isError"].is_null());
    assert_eq!(engine.calls(), vec!["load", "remove:bundle-1"]);
}
