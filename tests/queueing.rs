//! End-to-end admission behavior through the HTTP surface, driven by the
//! scripted [`FakeDriver`].

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use browserd::driver::FakeDriver;
use browserd::events::SessionEvents;
use browserd::server::{AppState, router};
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn harness_with_timeout(queue_timeout: Duration) -> (Arc<AppState>, Arc<FakeDriver>, Router) {
    let driver = Arc::new(FakeDriver::new());
    let events = Arc::new(SessionEvents::new());
    let state = AppState::new(driver.clone(), events, queue_timeout);
    let app = router(Arc::clone(&state));
    (state, driver, app)
}

fn harness() -> (Arc<AppState>, Arc<FakeDriver>, Router) {
    harness_with_timeout(Duration::from_secs(30))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap();
    (status, headers, body)
}

async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, HeaderMap, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, path: &str) -> (StatusCode, HeaderMap, Value) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    send(app, request).await
}

#[tokio::test]
async fn session_operations_rejected_before_start() {
    let (_state, driver, app) = harness();

    let (status, _, body) = post(&app, "/navigate", json!({ "url": "https://example.com" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "session_not_started");
    assert_eq!(body["queue"]["wait_ms"], 0);
    assert!(driver.calls().is_empty());
}

#[tokio::test]
async fn queued_operation_carries_metadata_and_reaches_driver() {
    let (_state, driver, app) = harness();

    let (status, headers, body) = post(&app, "/start", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-request-id"], "1");
    assert_eq!(headers["x-queue-wait-ms"], "0");
    assert_eq!(body["queue"]["queued_position"], 0);

    let (status, headers, body) = post(&app, "/navigate", json!({ "url": "https://example.com" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers["x-request-id"], "2");
    assert_eq!(body["queue"]["request_id"], 2);
    assert_eq!(body["queue"]["wait_ms"], 0);

    assert_eq!(driver.calls(), vec!["start", "navigate"]);
}

#[tokio::test]
async fn bypass_routes_answer_while_slot_is_held() {
    let (state, _driver, app) = harness();

    let holder_id = state.assign_request_id();
    let ticket = state.queue.enqueue(holder_id);
    let guard = state
        .queue
        .await_turn(&ticket, Duration::from_secs(1))
        .await
        .unwrap();

    let (status, _, body) = tokio::time::timeout(Duration::from_secs(1), get(&app, "/health"))
        .await
        .expect("health must not block behind the queue");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queue"]["wait_ms"], 0);

    let (status, _, body) = get(&app, "/queue").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queue_status"]["current_request_id"], holder_id);

    drop(guard);
    let (_, _, body) = get(&app, "/queue").await;
    assert_eq!(body["queue_status"]["current_request_id"], Value::Null);
}

#[tokio::test]
async fn admission_wait_is_bounded() {
    let (state, driver, app) = harness_with_timeout(Duration::from_millis(100));
    state.set_session_started(true);

    let holder_id = state.assign_request_id();
    let ticket = state.queue.enqueue(holder_id);
    let _guard = state
        .queue
        .await_turn(&ticket, Duration::from_secs(1))
        .await
        .unwrap();

    let (status, _, body) = post(&app, "/click", json!({ "selector": "#go" })).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"]["code"], "queue_timeout");
    assert!(body["queue"]["wait_ms"].as_u64().unwrap() >= 100);
    // The timed-out request never touched the session.
    assert!(driver.calls().is_empty());
    assert_eq!(state.queue.status().queue_length, 0);
}

#[tokio::test]
async fn failed_operation_still_releases_the_slot() {
    let (state, driver, app) = harness();
    state.set_session_started(true);
    driver.fail("click");

    let (status, _, body) = post(&app, "/click", json!({ "selector": "#go" })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"]["code"], "operation_failed");
    assert!(body["queue"]["request_id"].is_u64());

    // The queue did not jam: the next operation is admitted and runs.
    let (status, _, _) = post(&app, "/navigate", json!({ "url": "https://example.com" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(driver.calls(), vec!["click", "navigate"]);
}

#[tokio::test]
async fn concurrent_requests_execute_in_submission_order() {
    let (state, driver, app) = harness();
    state.set_session_started(true);
    driver.set_latency(Duration::from_millis(20));

    // Stagger the submissions slightly so enqueue order is deterministic,
    // then let them contend for the single slot.
    let mut tasks = Vec::new();
    for (path, body) in [
        ("/navigate", json!({ "url": "https://example.com/1" })),
        ("/click", json!({ "selector": "#a" })),
        ("/type", json!({ "selector": "#q", "text": "hi" })),
    ] {
        let app = app.clone();
        tasks.push(tokio::spawn(async move {
            post(&app, path, body).await
        }));
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    for task in tasks {
        let (status, _, _) = task.await.unwrap();
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(driver.calls(), vec!["navigate", "click", "type_text"]);
}

#[tokio::test]
async fn dom_lookup_routes_are_queued_and_session_gated() {
    let (state, driver, app) = harness();

    // Gated like every other session operation.
    let (status, _, body) = post(&app, "/cdp/dom/text", json!({ "selector": "h1" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "session_not_started");
    assert!(driver.calls().is_empty());

    state.set_session_started(true);
    for (path, op) in [
        ("/cdp/dom/text", "cdp_dom_text"),
        ("/cdp/dom/html", "cdp_dom_html"),
        ("/cdp/dom/attributes", "cdp_dom_attributes"),
    ] {
        let (status, _, body) = post(&app, path, json!({ "selector": "#main" })).await;
        assert_eq!(status, StatusCode::OK, "{path}");
        assert_eq!(body["op"], op);
        assert!(body["queue"]["request_id"].is_u64());
    }
    assert_eq!(
        driver.calls(),
        vec!["cdp_dom_text", "cdp_dom_html", "cdp_dom_attributes"]
    );
}

#[tokio::test]
async fn stop_gates_further_session_operations() {
    let (_state, _driver, app) = harness();

    let (status, _, _) = post(&app, "/start", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = post(&app, "/stop", json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, body) = post(&app, "/navigate", json!({ "url": "https://example.com" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "session_not_started");
}

#[tokio::test]
async fn every_response_is_correlated() {
    let (_state, _driver, app) = harness();

    let (_, first, _) = get(&app, "/").await;
    let (_, second, _) = get(&app, "/health").await;
    let id1: u64 = first["x-request-id"].to_str().unwrap().parse().unwrap();
    let id2: u64 = second["x-request-id"].to_str().unwrap().parse().unwrap();
    assert!(id2 > id1);
}
