use super::*;
use crate::ChatRole;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct Captured {
    bodies: Arc<Mutex<Vec<Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn capture(state: &Captured, headers: &HeaderMap, body: Value) {
    state.bodies.lock().await.push(body);
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        state.auth.lock().await.push(auth.to_string());
    }
}

async fn chat_ok(
    State(state): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    capture(&state, &headers, body).await;
    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": "  Silver light fell soft \n" } }]
    }))
}

async fn images_ok(
    State(state): State<Captured>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    capture(&state, &headers, body).await;
    Json(json!({ "created": 1, "data": [{ "url": "https://images.test/1.png" }] }))
}

async fn always_500() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn empty_lists() -> Json<Value> {
    Json(json!({ "choices": [], "data": [] }))
}

async fn spawn(app: Router) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/v1/")
}

async fn spawn_ok_server() -> (String, Captured) {
    let state = Captured::default();
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_ok))
        .route("/v1/images/generations", post(images_ok))
        .with_state(state.clone());
    (spawn(app).await, state)
}

#[tokio::test]
async fn completion_sends_model_messages_and_bearer_key() {
    let (base_url, captured) = spawn_ok_server().await;
    let client = OpenAiClient::new("sk-test", Some(base_url), "gpt-3.5-turbo");

    let reply = client
        .complete(
            vec![ChatMessage::system("be a poet"), ChatMessage::user("The moon rose")],
            &CompletionOptions::default(),
        )
        .await
        .expect("completion");
    assert_eq!(reply, "  Silver light fell soft \n");

    let bodies = captured.bodies.lock().await;
    let body = &bodies[0];
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["max_tokens"], 100);
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "The moon rose");
    assert_eq!(captured.auth.lock().await[0], "Bearer sk-test");
}

#[tokio::test]
async fn image_generation_requests_one_image_and_returns_url() {
    let (base_url, captured) = spawn_ok_server().await;
    let client = OpenAiClient::new("sk-test", Some(base_url), "unused");

    let url = client
        .generate_image(ImageRequest {
            prompt: "watercolor moon".into(),
            size: "512x512".into(),
        })
        .await
        .expect("image");
    assert_eq!(url, "https://images.test/1.png");

    let bodies = captured.bodies.lock().await;
    assert_eq!(bodies[0]["n"], 1);
    assert_eq!(bodies[0]["size"], "512x512");
    assert_eq!(bodies[0]["prompt"], "watercolor moon");
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let app = Router::new()
        .route("/v1/chat/completions", post(always_500))
        .route("/v1/images/generations", post(always_500));
    let client = OpenAiClient::new("sk-test", Some(spawn(app).await), "m");

    let err = client
        .complete(vec![ChatMessage::user("hi")], &CompletionOptions::default())
        .await
        .expect_err("should fail");
    match err {
        ProviderError::Status { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body, "upstream exploded");
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = client
        .generate_image(ImageRequest {
            prompt: "p".into(),
            size: "512x512".into(),
        })
        .await
        .expect_err("should fail");
    assert!(matches!(err, ProviderError::Status { status: 500, .. }));
}

#[tokio::test]
async fn empty_result_lists_are_invalid_responses() {
    let app = Router::new()
        .route("/v1/chat/completions", post(empty_lists))
        .route("/v1/images/generations", post(empty_lists));
    let client = OpenAiClient::new("sk-test", Some(spawn(app).await), "m");

    let err = client
        .complete(vec![ChatMessage::user("hi")], &CompletionOptions::default())
        .await
        .expect_err("should fail");
    assert!(matches!(err, ProviderError::InvalidResponse(_)));

    let err = client
        .generate_image(ImageRequest {
            prompt: "p".into(),
            size: "512x512".into(),
        })
        .await
        .expect_err("should fail");
    assert!(matches!(err, ProviderError::InvalidResponse(_)));
}

#[test]
fn roles_serialize_lowercase() {
    assert_eq!(serde_json::to_value(ChatRole::System).expect("json"), "system");
    assert_eq!(serde_json::to_value(ChatRole::Assistant).expect("json"), "assistant");
}
