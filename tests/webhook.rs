//! End-to-end tests of the webhook router against a recording Send API

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use messenger_webhook::webhook::{self, ACKNOWLEDGEMENT};
use messenger_webhook::{
    Bot, MessengerConfig, SendDispatcher, Transport, TransportResponse, WebhookState,
};

#[derive(Default)]
struct MockSendApi {
    bodies: Mutex<Vec<Value>>,
}

#[async_trait]
impl Transport for MockSendApi {
    async fn post_json(
        &self,
        _url: &str,
        _access_token: &str,
        body: &Value,
    ) -> anyhow::Result<TransportResponse> {
        self.bodies.lock().unwrap().push(body.clone());
        Ok(TransportResponse {
            status: 200,
            headers: Vec::new(),
            body: r#"{"recipient_id":"1","message_id":"mid.1"}"#.to_string(),
        })
    }
}

fn app() -> (Router, Arc<MockSendApi>) {
    let config = MessengerConfig::new("s3cret", Some("page-token".to_string()));
    let send_api = Arc::new(MockSendApi::default());
    let dispatcher = SendDispatcher::new(&config, None, send_api.clone()).unwrap();
    let state = WebhookState {
        config: Arc::new(config),
        bot: Arc::new(Bot::new(Arc::new(dispatcher), false)),
    };
    (webhook::router(state), send_api)
}

async fn get(app: Router, uri: &str) -> (StatusCode, String) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

async fn post(app: Router, body: Value) -> (StatusCode, String) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn page_batch(events: Vec<Value>) -> Value {
    json!({
        "object": "page",
        "entry": [{"id": "1", "time": 1458692752478i64, "messaging": events}]
    })
}

#[tokio::test]
async fn index_returns_greeting() {
    let (app, _) = app();
    let (status, body) = get(app, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "Hello, World!");
}

#[tokio::test]
async fn handshake_echoes_challenge() {
    let (app, _) = app();
    let (status, body) = get(
        app,
        "/webhook?hub.mode=subscribe&hub.verify_token=s3cret&hub.challenge=CHALLENGE_ACCEPTED",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "CHALLENGE_ACCEPTED");
}

#[tokio::test]
async fn handshake_mismatch_is_forbidden() {
    for uri in [
        "/webhook?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=c",
        "/webhook?hub.mode=unsubscribe&hub.verify_token=s3cret&hub.challenge=c",
        "/webhook?hub.verify_token=s3cret&hub.challenge=c",
        "/webhook?hub.mode=subscribe&hub.verify_token=s3cret",
        "/webhook",
    ] {
        let (app, _) = app();
        let (status, _) = get(app, uri).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{uri}");
    }
}

#[tokio::test]
async fn non_page_object_is_acknowledged_without_replies() {
    let (app, send_api) = app();
    let (status, body) = post(
        app,
        json!({
            "object": "instagram",
            "entry": [{"messaging": [{"sender": {"id": "9"}, "message": {"text": "generic"}}]}]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACKNOWLEDGEMENT);
    assert!(send_api.bodies.lock().unwrap().is_empty());
}

#[tokio::test]
async fn generic_keyword_gets_template_reply() {
    let (app, send_api) = app();
    let (status, body) = post(
        app,
        page_batch(vec![json!({
            "sender": {"id": "9"},
            "recipient": {"id": "1"},
            "timestamp": 1458692752478i64,
            "message": {"mid": "mid.1457764197618:41d102a3e1ae206a38", "text": "generic"}
        })]),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ACKNOWLEDGEMENT);

    let bodies = send_api.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["recipient"]["id"], "9");
    assert_eq!(bodies[0]["message"]["attachment"]["type"], "template");
    assert_eq!(
        bodies[0]["message"]["attachment"]["payload"]["template_type"],
        "generic"
    );
}

#[tokio::test]
async fn other_text_gets_fallback_reply() {
    let (app, send_api) = app();
    post(
        app,
        page_batch(vec![json!({"sender": {"id": "9"}, "message": {"text": "hello there"}})]),
    )
    .await;

    let bodies = send_api.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["message"], json!({"text": "Message received"}));
}

#[tokio::test]
async fn attachments_get_one_informational_reply() {
    let (app, send_api) = app();
    post(
        app,
        page_batch(vec![json!({
            "sender": {"id": "9"},
            "message": {"attachments": [{"type": "image", "payload": {"url": "https://x/y.png"}}]}
        })]),
    )
    .await;

    let bodies = send_api.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(
        bodies[0]["message"],
        json!({"text": "Message with attachment received"})
    );
}

#[tokio::test]
async fn postback_gets_confirmation() {
    let (app, send_api) = app();
    post(
        app,
        page_batch(vec![json!({
            "sender": {"id": "9"},
            "postback": {"payload": "Payload for first bubble"}
        })]),
    )
    .await;

    let bodies = send_api.bodies.lock().unwrap();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["message"], json!({"text": "Postback called"}));
}

#[tokio::test]
async fn malformed_body_is_still_acknowledged() {
    let (app, send_api) = app();
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(send_api.bodies.lock().unwrap().is_empty());
}
