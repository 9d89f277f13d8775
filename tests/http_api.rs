//! HTTP transport tests driving the router in-process.
#![cfg(feature = "http")]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use parley::http::{AppState, router};
use parley::storage::{MemoryBackend, PersistenceBackend};
use parley::{BaseMessage, ConversationStore};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

fn app() -> Router {
    let backend: Box<dyn PersistenceBackend> = Box::new(MemoryBackend::new());
    let store = Arc::new(ConversationStore::new(backend));
    router(AppState::new(store, BaseMessage::new("system", "You are helpful.")))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create(app: &Router, user: &str) -> Value {
    let (status, body) = send(
        app,
        Method::PUT,
        "/conversation",
        Some(json!({ "userIdentity": user })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body
}

async fn append(app: &Router, user: &str, content: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/add/conversation",
        Some(json!({
            "userIdentity": user,
            "conversationId": "ignored",
            "message": { "role": "user", "content": content }
        })),
    )
    .await
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_full_conversation_flow() {
    let app = app();

    let created = create(&app, "u1").await;
    assert_eq!(created["initiator"], "u1");
    assert_eq!(created["id"], created["conversation"]["id"]);
    assert_eq!(created["conversation"]["messages"][0]["content"], "You are helpful.");

    let (status, message) = append(&app, "u1", "hi").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(message["tags"], json!([]));
    assert_eq!(message["read"], false);
    let message_id = message["id"].as_str().unwrap().to_string();

    let (status, tagged) = send(
        &app,
        Method::POST,
        "/conversation/tag",
        Some(json!({ "userIdentity": "u1", "messageId": message_id, "tag": "important" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tagged["tags"], json!(["important"]));

    let (status, marked) = send(
        &app,
        Method::POST,
        "/conversation/mark",
        Some(json!({ "userIdentity": "u1", "messageId": message_id, "read": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["read"], true);

    let (status, hits) = send(&app, Method::GET, "/conversation/u1/search?q=hi", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits.as_array().unwrap().len(), 1);

    let (status, summary) = send(&app, Method::GET, "/conversation/u1/summary", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["summary"], "You are helpful. hi");

    let (status, conversation) = send(&app, Method::GET, "/conversation/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(conversation["messages"].as_array().unwrap().len(), 2);

    let (status, _) = send(&app, Method::DELETE, "/conversation/u1", None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = send(&app, Method::DELETE, "/conversation/u1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("u1"));

    let (status, _) = send(&app, Method::GET, "/conversation/u1", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_append_error_precedence() {
    let app = app();

    let (status, _) = append(&app, "ghost", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for payload in [
        json!({ "userIdentity": "ghost", "message": null }),
        json!({ "userIdentity": "ghost", "message": { "role": null, "content": null } }),
    ] {
        let (status, _) = send(&app, Method::POST, "/add/conversation", Some(payload)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    create(&app, "u1").await;
    let (status, body) = append(&app, "u1", "").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("content"));

    let (status, _) = send(
        &app,
        Method::POST,
        "/add/conversation",
        Some(json!({ "userIdentity": "u1", "message": null })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = app();
    let request = Request::builder()
        .method(Method::PUT)
        .uri("/conversation")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_with_empty_identity() {
    let (status, _) = send(
        &app(),
        Method::PUT,
        "/conversation",
        Some(json!({ "userIdentity": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_message_is_not_found() {
    let app = app();
    create(&app, "u1").await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/conversation/mark",
        Some(json!({ "userIdentity": "u1", "messageId": "nope", "read": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_without_match_is_empty_list() {
    let app = app();
    create(&app, "u1").await;

    let (status, hits) = send(&app, Method::GET, "/conversation/u1/search?q=zebra", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(hits, json!([]));
}

#[tokio::test]
async fn test_search_without_term_returns_every_message() {
    let app = app();
    create(&app, "u1").await;
    append(&app, "u1", "first").await;
    append(&app, "u1", "second").await;

    for uri in ["/conversation/u1/search", "/conversation/u1/search?q="] {
        let (status, hits) = send(&app, Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let contents: Vec<_> = hits
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents, vec!["You are helpful.", "first", "second"]);
    }
}

#[tokio::test]
async fn test_cors_headers_present() {
    let request = Request::builder()
        .method(Method::GET)
        .uri("/health")
        .header("origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    assert!(response.headers().contains_key("access-control-allow-origin"));
    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
}
