// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Route-level tests driven through `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use herald_campaign::{CampaignService, EngineSettings, JobStore, SendEngine};
use herald_gateway::{AppState, AuthConfig, DEFAULT_MAX_BODY_BYTES, GatewayConfig, router};
use herald_resolver::Resolver;
use herald_test_utils::MockChannel;
use serde_json::{Value, json};
use tower::ServiceExt;

struct Harness {
    app: Router,
    service: CampaignService,
    channel: Arc<MockChannel>,
}

fn gateway(max_body_bytes: usize) -> GatewayConfig {
    GatewayConfig {
        host: "127.0.0.1".into(),
        port: 0,
        cors_origins: vec!["*".into()],
        max_body_bytes,
    }
}

fn harness(auth: AuthConfig) -> Harness {
    harness_with(auth, DEFAULT_MAX_BODY_BYTES)
}

fn harness_with(auth: AuthConfig, max_body_bytes: usize) -> Harness {
    let channel = Arc::new(MockChannel::new());
    let engine = SendEngine::new(channel.clone(), EngineSettings::default());
    let service = CampaignService::new(Arc::new(JobStore::new()), engine);
    let state = AppState::new(service.clone(), Resolver::default(), Duration::ZERO).with_auth(auth);
    Harness {
        app: router(state, &gateway(max_body_bytes)),
        service,
        channel,
    }
}

fn open() -> Harness {
    harness(AuthConfig::default())
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn wait_done(service: &CampaignService, id: &str) {
    let mut rx = service.subscribe(id).unwrap();
    rx.wait_for(|p| !p.running).await.unwrap();
}

#[tokio::test]
async fn send_starts_job_and_progress_reports_it() {
    let h = open();
    let (status, body) = call(
        &h.app,
        post(
            "/send",
            json!({
                "messages": [
                    {"to": "999111222", "text": "Hola Ana"},
                    {"to": "+51 999 111 333", "text": "Hola Luis"}
                ],
                "delaySeconds": 0
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    let id = body["jobId"].as_str().unwrap().to_string();

    wait_done(&h.service, &id).await;
    assert_eq!(
        h.channel.destinations().await,
        vec!["51999111222", "51999111333"]
    );

    let (status, progress) = call(&h.app, get(&format!("/progress?jobId={id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(progress["total"], 2);
    assert_eq!(progress["sent"], 2);
    assert_eq!(progress["failed"], 0);
    assert_eq!(progress["running"], false);
    assert_eq!(progress["state"], "done");
    assert_eq!(progress["lastError"], "");
}

#[tokio::test]
async fn send_without_sendable_units_is_rejected() {
    let h = open();
    let (status, body) = call(
        &h.app,
        post(
            "/send",
            json!({"messages": [{"to": "", "text": "hi"}, {"to": "999111222", "text": ""}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_job");
    assert_eq!(h.service.summary().jobs, 0);
}

#[tokio::test]
async fn malformed_data_url_is_rejected() {
    let h = open();
    let (status, body) = call(
        &h.app,
        post(
            "/send",
            json!({"messages": [{"to": "999111222", "text": "hi", "image": {"dataUrl": "data:image/png,nope"}}]}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_input");
}

#[tokio::test]
async fn shared_inline_image_is_decoded_once() {
    let h = open();
    let image = json!({"dataUrl": "data:image/png;base64,aGk="});
    let (status, body) = call(
        &h.app,
        post(
            "/send",
            json!({
                "messages": [
                    {"to": "999111222", "text": "a", "image": image},
                    {"to": "999111333", "text": "b", "image": image}
                ]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    wait_done(&h.service, body["jobId"].as_str().unwrap()).await;

    let units = h.channel.dispatched().await;
    let (a, b) = (units[0].image.as_ref().unwrap(), units[1].image.as_ref().unwrap());
    assert!(Arc::ptr_eq(a, b));
}

/// Thirty messages repeating a ~100 KB inline image, about 3 MB of JSON.
fn image_campaign() -> Value {
    let image = json!({"dataUrl": format!("data:image/png;base64,{}", "QUFB".repeat(25_000))});
    let messages: Vec<Value> = (0..30)
        .map(|i| json!({"to": format!("9991112{i:02}"), "text": "Promo", "image": image}))
        .collect();
    json!({"messages": messages, "delaySeconds": 0})
}

#[tokio::test]
async fn image_campaign_over_two_megabytes_is_accepted() {
    let h = open();
    let body = image_campaign();
    assert!(body.to_string().len() > 2 * 1024 * 1024);

    let (status, created) = call(&h.app, post("/send", body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["total"], 30);
    wait_done(&h.service, created["jobId"].as_str().unwrap()).await;
    assert_eq!(h.channel.call_count().await, 30);
}

#[tokio::test]
async fn body_over_configured_limit_is_rejected() {
    let h = harness_with(AuthConfig::default(), 1024 * 1024);
    let response = h
        .app
        .clone()
        .oneshot(post("/send", image_campaign()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(h.service.summary().jobs, 0);
}

#[tokio::test]
async fn campaign_resolves_table_with_detected_phone_column() {
    let h = open();
    let (status, body) = call(
        &h.app,
        post(
            "/campaigns",
            json!({
                "headers": ["Nombre", "Teléfono"],
                "rows": [["Ana", 999111222], ["Sin número", ""], ["Luis", "999-111-333"]],
                "template": "Hola {{nombre}}"
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    wait_done(&h.service, body["jobId"].as_str().unwrap()).await;

    let units = h.channel.dispatched().await;
    assert_eq!(units[0].text, "Hola Ana");
    assert_eq!(units[1].destination, "51999111333");
}

#[tokio::test]
async fn preview_renders_one_row() {
    let h = open();
    let table = json!({
        "headers": ["Nombre", "Celular"],
        "rows": [["Ana", "999111222"], ["Luis", "999111333"]],
        "template": "Hola {{nombre}}",
        "row": 1
    });
    let (status, body) = call(&h.app, post("/preview", table)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Hola Luis");

    let (status, _) = call(
        &h.app,
        post(
            "/preview",
            json!({"headers": ["Nombre"], "rows": [], "template": "x", "row": 0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn control_routes_ack_and_reject_unknown_ids() {
    let h = open();
    let id = h
        .service
        .start(herald_test_utils::sample_units(3), Duration::from_secs(60))
        .unwrap();

    for route in ["/pause", "/resume", "/cancel"] {
        let (status, body) = call(&h.app, post(route, json!({"jobId": id.as_str()}))).await;
        assert_eq!(status, StatusCode::OK, "{route}");
        assert_eq!(body, json!({"ok": true}));

        let (status, body) = call(&h.app, post(route, json!({"jobId": "nope"}))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{route}");
        assert_eq!(body["code"], "not_found");
    }

    wait_done(&h.service, id.as_str()).await;
    assert!(h.service.progress(id.as_str()).unwrap().cancelled);
}

#[tokio::test]
async fn progress_for_unknown_job_is_404() {
    let h = open();
    let (status, _) = call(&h.app, get("/progress?jobId=missing")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_reports_session_and_jobs() {
    let h = open();
    h.channel.set_logged_in(false);
    let (status, body) = call(&h.app, get("/status")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"loggedIn": false, "jobs": 0, "running": false}));

    h.channel.set_logged_in(true);
    let (_, body) = call(&h.app, get("/status")).await;
    assert_eq!(body["loggedIn"], true);
}

#[tokio::test]
async fn progress_stream_is_event_stream() {
    let h = open();
    let id = h
        .service
        .start(herald_test_utils::sample_units(1), Duration::ZERO)
        .unwrap();
    wait_done(&h.service, id.as_str()).await;

    let response = h
        .app
        .clone()
        .oneshot(get(&format!("/progress/stream?jobId={id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("event: progress"));
    assert!(text.contains("\"running\":false"));
}

#[tokio::test]
async fn bearer_token_guards_everything_but_health() {
    let h = harness(AuthConfig {
        bearer_token: Some("s3cret".into()),
    });

    let (status, _) = call(&h.app, get("/status")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let authed = Request::builder()
        .uri("/status")
        .header(header::AUTHORIZATION, "Bearer s3cret")
        .body(Body::empty())
        .unwrap();
    let (status, _) = call(&h.app, authed).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&h.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["uptimeSecs"].is_u64());
}
