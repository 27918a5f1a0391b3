//! Webhook router tests, driven through `tower::ServiceExt::oneshot`
//!
//! Run with: cargo test --test webhook_test

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::mpsc;
use tower::ServiceExt;

use workouts_bot::core::Metrics;
use workouts_bot::storage::create_pool;
use workouts_bot::telegram::event::InboundEvent;
use workouts_bot::telegram::transport::webhook::SECRET_HEADER;
use workouts_bot::telegram::transport::{router, WebhookState};

struct Harness {
    _dir: TempDir,
    app: Router,
    events: mpsc::Receiver<InboundEvent>,
}

fn harness(secret: Option<&str>) -> Harness {
    let dir = TempDir::new().unwrap();
    let pool = create_pool(dir.path().join("hook.sqlite").to_str().unwrap()).unwrap();
    let (tx, rx) = mpsc::channel(4);
    let state = WebhookState {
        events: tx,
        db_pool: Arc::new(pool),
        metrics: Arc::new(Metrics::new().unwrap()),
        secret_token: secret.map(Arc::from),
    };
    Harness {
        _dir: dir,
        app: router("/webhook", state),
        events: rx,
    }
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn update_body() -> Body {
    Body::from(
        json!({
            "update_id": 1,
            "message": {
                "message_id": 5,
                "date": 1_700_000_000,
                "chat": {"id": 42, "type": "private", "first_name": "Ира"},
                "from": {"id": 42, "is_bot": false, "first_name": "Ира"},
                "text": "💪 Упражнения"
            }
        })
        .to_string(),
    )
}

#[tokio::test]
async fn test_health_and_ping() {
    let h = harness(None);

    let response = h
        .app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "OK");

    let response = h
        .app
        .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "PONG");
}

#[tokio::test]
async fn test_migrate_is_idempotent() {
    let h = harness(None);

    let response = h
        .app
        .oneshot(Request::post("/migrate").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_text(response).await, "MIGRATED");
}

#[tokio::test]
async fn test_delivered_update_reaches_event_stream() {
    let mut h = harness(None);

    let response = h
        .app
        .oneshot(
            Request::post("/webhook")
                .header("content-type", "application/json")
                .body(update_body())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    match h.events.try_recv().unwrap() {
        InboundEvent::Command(cmd) => {
            assert_eq!(cmd.chat_id, 42);
            assert_eq!(cmd.text, "💪 Упражнения");
        }
        other => panic!("unexpected event {:?}", other),
    }
}

#[tokio::test]
async fn test_wrong_secret_is_rejected() {
    let mut h = harness(Some("s3cret"));

    let response = h
        .app
        .clone()
        .oneshot(
            Request::post("/webhook")
                .header(SECRET_HEADER, "guess")
                .body(update_body())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(h.events.try_recv().is_err());

    let response = h
        .app
        .oneshot(
            Request::post("/webhook")
                .header(SECRET_HEADER, "s3cret")
                .body(update_body())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(h.events.try_recv().is_ok());
}

#[tokio::test]
async fn test_garbage_body_is_acknowledged_and_dropped() {
    let mut h = harness(None);

    let response = h
        .app
        .oneshot(Request::post("/webhook").body(Body::from("not json")).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(h.events.try_recv().is_err());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let h = harness(None);

    let response = h
        .app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("workouts_bot_handlers_in_flight"));
}
