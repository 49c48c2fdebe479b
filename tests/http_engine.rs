//! `HttpEngine` against a local stand-in for the Pipelex API service.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use pipelex_mcp_server::engine::{BundleHandle, EngineError, HttpEngine, PipelineEngine};
use pipelex_mcp_server::stuff::{Stuff, WorkingMemory};
use serde_json::{json, Value};

#[derive(Clone, Default)]
struct Recorder {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
    auth: Arc<Mutex<Option<String>>>,
}

fn concept(code: &str) -> Value {
    json!({ "code": code, "structure_class_name": code.rsplit('.').next().unwrap() })
}

async fn health(State(rec): State<Recorder>, headers: HeaderMap) -> Json<Value> {
    *rec.auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    Json(json!({ "status": "ok" }))
}

async fn build(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    rec.requests.lock().unwrap().push(("build".into(), body));
    Json(json!({ "plx_content": "domain = \"demo\"", "main_pipe": "hello" }))
}

async fn load(State(rec): State<Recorder>, Json(body): Json<Value>) -> Response {
    let plx = body["plx_content"].as_str().unwrap_or_default().to_string();
    rec.requests.lock().unwrap().push(("load".into(), body));
    if plx.contains("broken") {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error_type": "pipe_definition_error", "message": "line 1: broken" })),
        )
            .into_response();
    }
    Json(json!({
        "bundle_id": "b-42",
        "domain": "demo",
        "main_pipe": "hello",
        "pipes": [{
            "code": "hello",
            "domain": "demo",
            "inputs": [{ "name": "name", "concept": concept("native.Text") }],
            "output": concept("native.Text")
        }]
    }))
    .into_response()
}

async fn remove(State(rec): State<Recorder>, Path(id): Path<String>) -> StatusCode {
    rec.requests.lock().unwrap().push(("remove".into(), json!(id)));
    StatusCode::NO_CONTENT
}

async fn execute(State(rec): State<Recorder>, Json(body): Json<Value>) -> Json<Value> {
    rec.requests.lock().unwrap().push(("execute".into(), body));
    Json(json!({ "working_memory": { "root": {}, "aliases": {} } }))
}

async fn pipes() -> Json<Value> {
    Json(json!({ "pipes": [{ "code": "hello", "domain": "demo", "output": concept("native.Text") }] }))
}

async fn spawn_service() -> (String, Recorder) {
    let rec = Recorder::default();
    let app = Router::new()
        .route("/health", get(health))
        .route("/api/v1/build", post(build))
        .route("/api/v1/bundles", post(load))
        .route("/api/v1/bundles/{id}", delete(remove))
        .route("/api/v1/pipeline/execute", post(execute))
        .route("/api/v1/pipes", get(pipes))
        .with_state(rec.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), rec)
}

#[tokio::test]
async fn probe_sends_bearer_token() {
    let (url, rec) = spawn_service().await;
    let engine = HttpEngine::new(url, Some("secret".into())).unwrap();
    engine.probe().await.unwrap();
    assert_eq!(rec.auth.lock().unwrap().as_deref(), Some("Bearer secret"));
}

#[tokio::test]
async fn bundle_lifecycle_round_trips() {
    let (url, rec) = spawn_service().await;
    let engine = HttpEngine::new(url, None).unwrap();

    let built = engine.build_bundle("say hello").await.unwrap();
    assert_eq!(built.main_pipe.as_deref(), Some("hello"));

    let bundle = engine.load_bundle(&built.plx_content).await.unwrap();
    assert_eq!(bundle.handle, BundleHandle("b-42".into()));
    assert_eq!(bundle.pipe("hello").unwrap().inputs[0].concept.code, "native.Text");

    let mut memory = WorkingMemory::new();
    memory.insert("name", Stuff::text("Ada"));
    engine.execute("hello", &memory).await.unwrap();
    engine.remove_bundle(&bundle.handle).await.unwrap();

    let requests = rec.requests.lock().unwrap().clone();
    let kinds: Vec<&str> = requests.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(kinds, vec!["build", "load", "execute", "remove"]);
    assert_eq!(requests[0].1, json!({ "brief": "say hello" }));
    assert_eq!(
        requests[2].1,
        json!({
            "pipe_code": "hello",
            "inputs": { "name": { "concept": "native.Text", "content": { "text": "Ada" } } }
        })
    );
    assert_eq!(requests[3].1, json!("b-42"));
}

#[tokio::test]
async fn definition_errors_are_classified() {
    let (url, _rec) = spawn_service().await;
    let engine = HttpEngine::new(url, None).unwrap();

    let err = engine.load_bundle("broken").await.unwrap_err();
    assert!(matches!(err, EngineError::PipeDefinition(ref m) if m == "line 1: broken"), "{err}");
}

#[tokio::test]
async fn list_pipes_defaults_missing_fields() {
    let (url, _rec) = spawn_service().await;
    let engine = HttpEngine::new(url, None).unwrap();

    let pipes = engine.list_pipes().await.unwrap();
    assert_eq!(pipes.len(), 1);
    assert!(pipes[0].inputs.is_empty());
    assert_eq!(pipes[0].description, None);
}

#[tokio::test]
async fn unreachable_engine_is_unavailable() {
    // Bind then drop to get a port nobody listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let engine = HttpEngine::new(format!("http://{addr}"), None).unwrap();
    assert!(matches!(engine.probe().await, Err(EngineError::Unavailable(_))));
}
