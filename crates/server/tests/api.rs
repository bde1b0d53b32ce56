//! HTTP-level tests for the comment API, run against the in-memory store.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use storage::MemoryStore;
use tower::util::ServiceExt;

use server::{build_router, AppState};

fn app() -> Router {
    let state = AppState::new(Arc::new(MemoryStore::new()), "test-salt");
    build_router(state, "*")
}

fn request(method: &str, uri: &str, origin: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(origin) = origin {
        builder = builder.header("x-forwarded-for", origin);
    }
    match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

async fn post_comment(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, request("POST", "/api/comments", None, Some(body))).await
}

#[tokio::test]
async fn health_reports_ok() {
    let (status, body) = send(&app(), request("GET", "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn post_returns_created_comment() {
    let app = app();
    let (status, body) = post_comment(
        &app,
        json!({ "mediaItemId": "m1", "text": "great show", "name": "Ferris" }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["mediaItemId"], "m1");
    assert_eq!(body["text"], "great show");
    assert_eq!(body["likesCount"], 0);
    assert_eq!(body["likedByMe"], false);
    assert!(body["parentId"].is_null());
    assert_eq!(body["id"].as_str().unwrap().len(), 24);
    assert!(body["createdAt"].is_string());
}

#[tokio::test]
async fn post_validation_failures_are_400() {
    let app = app();
    for payload in [
        json!({ "text": "no media item" }),
        json!({ "mediaItemId": "m1" }),
        json!({ "mediaItemId": "m1", "text": "   " }),
        json!({ "mediaItemId": "m1", "text": "a".repeat(501) }),
    ] {
        let (status, body) = post_comment(&app, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    let (status, _) = send(
        &app,
        Request::builder()
            .method("POST")
            .uri("/api/comments")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_comment(&app, json!({ "mediaItemId": "m1", "text": "a".repeat(500) })).await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn like_flow_over_http() {
    let app = app();
    let (_, created) = post_comment(&app, json!({ "mediaItemId": "m1", "text": "like me" })).await;
    let uri = format!("/api/comments/{}/like", created["id"].as_str().unwrap());

    let (status, body) = send(&app, request("POST", &uri, Some("198.51.100.1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "likesCount": 1 }));

    // same first hop, different proxy chain
    let (status, body) = send(
        &app,
        request("POST", &uri, Some("198.51.100.1, 10.0.0.3"), None),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["likesCount"], 1);
    assert!(body["error"].is_string());

    let (status, body) = send(&app, request("POST", &uri, Some("198.51.100.2"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likesCount"], 2);

    let (status, body) = send(&app, request("DELETE", &uri, Some("198.51.100.1"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["likesCount"], 1);

    let (status, body) = send(&app, request("DELETE", &uri, Some("198.51.100.1"), None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["likesCount"], 1);
}

#[tokio::test]
async fn like_rejects_bad_and_unknown_ids() {
    let app = app();
    let (status, _) = send(&app, request("POST", "/api/comments/xyz/like", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        request("DELETE", "/api/comments/0123456789abcdef01234567/like", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_marks_liked_by_me_per_requester() {
    let app = app();
    let (_, older) = post_comment(&app, json!({ "mediaItemId": "m1", "text": "older" })).await;
    post_comment(&app, json!({ "mediaItemId": "m1", "text": "newer" })).await;

    let uri = format!("/api/comments/{}/like", older["id"].as_str().unwrap());
    send(&app, request("POST", &uri, Some("192.0.2.7"), None)).await;

    let (status, mine) = send(
        &app,
        request("GET", "/api/comments?mediaItemId=m1", Some("192.0.2.7"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let mine = mine.as_array().unwrap();
    assert_eq!(mine.len(), 2);
    assert_eq!(mine[0]["text"], "newer");
    assert_eq!(mine[1]["text"], "older");
    assert_eq!(mine[1]["likedByMe"], true);
    assert_eq!(mine[1]["likesCount"], 1);

    let (_, theirs) = send(
        &app,
        request("GET", "/api/comments?mediaItemId=m1", Some("192.0.2.8"), None),
    )
    .await;
    assert_eq!(theirs[1]["likedByMe"], false);

    // nothing resembling the ledger leaks out
    let raw = theirs.to_string();
    assert!(!raw.contains("192.0.2.7"));
    assert!(!raw.contains("likedIdentities"));
}

#[tokio::test]
async fn list_requires_media_item() {
    let (status, _) = send(&app(), request("GET", "/api/comments", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn tree_nests_replies_and_folds_extras() {
    let app = app();
    let (_, root) = post_comment(&app, json!({ "mediaItemId": "m1", "text": "root" })).await;
    let root_id = root["id"].as_str().unwrap();
    for text in ["r1", "r2", "r3"] {
        post_comment(
            &app,
            json!({ "mediaItemId": "m1", "text": text, "parentId": root_id }),
        )
        .await;
    }
    post_comment(
        &app,
        json!({ "mediaItemId": "m1", "text": "lost", "parentId": "ffffffffffffffffffffffff" }),
    )
    .await;

    let (status, threads) = send(
        &app,
        request("GET", "/api/comments/tree?mediaItemId=m1", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let threads = threads.as_array().unwrap();
    assert_eq!(threads.len(), 2);
    assert_eq!(threads[0]["text"], "lost");
    assert_eq!(threads[1]["text"], "root");
    assert_eq!(threads[1]["replies"].as_array().unwrap().len(), 3);
    assert_eq!(threads[1]["replies"][0]["text"], "r3");
    assert_eq!(threads[1]["hiddenReplies"], 2);
}

#[tokio::test]
async fn counts_by_media_items() {
    let app = app();
    for text in ["1", "2", "3"] {
        post_comment(&app, json!({ "mediaItemId": "x", "text": text })).await;
    }

    let (status, body) = send(
        &app,
        request("GET", "/api/comments/count?mediaItemIds=x,%20y", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "x": 3, "y": 0 }));

    let (status, body) = send(
        &app,
        request("GET", "/api/comments/count?mediaItemIds=x,bad%20id!,,", None, None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "x": 3, "bad id!": 0 }));

    let (status, _) = send(&app, request("GET", "/api/comments/count", None, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
