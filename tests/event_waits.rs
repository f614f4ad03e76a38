//! Dialog and download wait flows: latched events, resolving actions, and
//! bounded timeouts observed through the HTTP surface.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use browserd::driver::FakeDriver;
use browserd::events::{DialogEvent, DownloadEvent, SessionEvents};
use browserd::server::{AppState, router};
use serde_json::{Value, json};
use tower::util::ServiceExt;

fn harness() -> (Arc<AppState>, Arc<FakeDriver>, Router) {
    let driver = Arc::new(FakeDriver::new());
    let events = Arc::new(SessionEvents::new());
    let state = AppState::new(driver.clone(), events, Duration::from_secs(30));
    state.set_session_started(true);
    let app = router(Arc::clone(&state));
    (state, driver, app)
}

async fn post(app: &Router, path: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn get(app: &Router, path: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(path).body(Body::empty()).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn dialog(message: &str) -> DialogEvent {
    DialogEvent {
        kind: "confirm".to_string(),
        message: message.to_string(),
        default_value: String::new(),
    }
}

fn download(filename: &str) -> DownloadEvent {
    DownloadEvent {
        url: format!("https://example.com/{filename}"),
        path: Some(format!("/tmp/downloads/{filename}")),
        filename: filename.to_string(),
        error: None,
    }
}

#[tokio::test]
async fn download_finished_before_wait_is_observed() {
    let (state, _driver, app) = harness();
    state.events.record_download(download("f.txt"));

    let (status, body) = post(&app, "/download/await", json!({ "timeout": 5000 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["download"]["filename"], "f.txt");
}

#[tokio::test]
async fn download_wait_resolves_when_event_arrives_later() {
    let (state, _driver, app) = harness();

    let publisher = {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            state.events.record_download(download("late.bin"));
        })
    };

    let (status, body) = post(&app, "/download/await", json!({ "timeout": 5000 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["download"]["filename"], "late.bin");
    publisher.await.unwrap();
}

#[tokio::test]
async fn dialog_wait_times_out_without_consuming() {
    let (state, _driver, app) = harness();

    let (status, body) = post(&app, "/dialog/await", json!({ "timeout": 100 })).await;
    assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
    assert_eq!(body["error"]["code"], "event_timeout");

    // A dialog raised after the timed-out wait is still observable.
    state.events.dialog.publish(dialog("still here"));
    let (status, body) = post(&app, "/dialog/await", json!({ "timeout": 1000 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dialog"]["message"], "still here");
}

#[tokio::test]
async fn dialog_wait_with_accept_action_resolves_driver_side() {
    let (state, driver, app) = harness();
    state.events.dialog.publish(dialog("proceed?"));

    let (status, body) = post(
        &app,
        "/dialog/await",
        json!({ "timeout": 1000, "action": "accept", "prompt_text": "yes" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["handled"], "accept");
    assert_eq!(body["dialog"]["message"], "proceed?");
    assert_eq!(driver.calls(), vec!["dialog_accept"]);
}

#[tokio::test]
async fn dialog_wait_with_dismiss_action() {
    let (state, driver, app) = harness();
    state.events.dialog.publish(dialog("leave page?"));

    let (status, body) = post(&app, "/dialog/await", json!({ "timeout": 1000, "action": "dismiss" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["handled"], "dismiss");
    assert_eq!(driver.calls(), vec!["dialog_dismiss"]);
}

#[tokio::test]
async fn download_history_is_readable_without_queueing() {
    let (state, _driver, app) = harness();
    state.events.record_download(download("a.txt"));
    state.events.record_download(download("b.txt"));

    // Consume the latch; the passive history must be unaffected.
    let (status, _) = post(&app, "/download/await", json!({ "timeout": 1000 })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = get(&app, "/downloads").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["downloads"].as_array().unwrap().len(), 2);

    let (status, body) = get(&app, "/downloads/last").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["download"]["filename"], "b.txt");
}

#[tokio::test]
async fn event_wait_occupies_the_admission_slot() {
    let (state, _driver, app) = harness();

    let waiter = {
        let app = app.clone();
        tokio::spawn(async move { post(&app, "/dialog/await", json!({ "timeout": 2000 })).await })
    };
    // Let the wait be admitted, then confirm it holds the slot.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let status = state.queue.status();
    assert!(status.current_request_id.is_some());

    state.events.dialog.publish(dialog("now"));
    let (code, body) = waiter.await.unwrap();
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["dialog"]["message"], "now");
    assert_eq!(state.queue.status().current_request_id, None);
}
