//! HTTP surface and the orchestration glue between the classifier, the
//! admission queue, the event latches, and the driver.

pub mod extract;
pub mod handlers;

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use url::Url;

use crate::classify::OperationKind;
use crate::cli::Cli;
use crate::driver::{SessionDriver, UpstreamDriver};
use crate::error::{Error, Result};
use crate::events::SessionEvents;
use crate::queue::AdmissionQueue;

/// Process-wide state shared by every handler.
pub struct AppState {
    pub queue: Arc<AdmissionQueue>,
    pub events: Arc<SessionEvents>,
    pub driver: Arc<dyn SessionDriver>,
    pub queue_timeout: Duration,
    started: AtomicBool,
    next_request_id: AtomicU64,
}

impl AppState {
    pub fn new(
        driver: Arc<dyn SessionDriver>,
        events: Arc<SessionEvents>,
        queue_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue: Arc::new(AdmissionQueue::new()),
            events,
            driver,
            queue_timeout,
            started: AtomicBool::new(false),
            next_request_id: AtomicU64::new(0),
        })
    }

    /// Assigns the next request identifier; every inbound call gets one,
    /// bypassed or queued.
    pub fn assign_request_id(&self) -> u64 {
        self.next_request_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn session_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    pub fn set_session_started(&self, started: bool) {
        self.started.store(started, Ordering::Release);
    }
}

/// Queue metadata attached to every response.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct QueueMeta {
    pub request_id: u64,
    pub queued_position: usize,
    pub wait_ms: u64,
}

impl QueueMeta {
    fn bypass(request_id: u64) -> Self {
        Self {
            request_id,
            queued_position: 0,
            wait_ms: 0,
        }
    }
}

/// Classifies and runs one inbound operation.
///
/// Bypass kinds run immediately with zero-wait metadata. Queued kinds
/// enqueue, suspend until admitted (bounded by the configured queue timeout),
/// run the operation while holding the admission guard, and release via
/// guard drop on every exit path. The response always carries the request id,
/// arrival position, and measured wait.
pub async fn execute<F, Fut>(state: Arc<AppState>, kind: OperationKind, op: F) -> Response
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value>>,
{
    let request_id = state.assign_request_id();

    if kind.bypasses_queue() {
        let outcome = op().await;
        return respond(kind, outcome, QueueMeta::bypass(request_id));
    }

    if kind.requires_session() && !state.session_started() {
        return respond(kind, Err(Error::SessionNotStarted), QueueMeta::bypass(request_id));
    }

    let ticket = state.queue.enqueue(request_id);
    let queued_position = ticket.arrival_order();
    debug!(target: "browserd", request_id, operation = %kind, queued_position, "request queued");

    match state.queue.await_turn(&ticket, state.queue_timeout).await {
        Err(err) => {
            let wait_ms = match &err {
                Error::QueueTimeout { waited_ms } => *waited_ms,
                _ => 0,
            };
            respond(
                kind,
                Err(err),
                QueueMeta {
                    request_id,
                    queued_position,
                    wait_ms,
                },
            )
        }
        Ok(guard) => {
            let meta = QueueMeta {
                request_id,
                queued_position,
                wait_ms: guard.wait_ms(),
            };
            let outcome = op().await;
            drop(guard);
            respond(kind, outcome, meta)
        }
    }
}

fn respond(kind: OperationKind, outcome: Result<Value>, meta: QueueMeta) -> Response {
    let (status, mut body) = match outcome {
        Ok(Value::Object(map)) => (StatusCode::OK, Value::Object(map)),
        Ok(other) => (StatusCode::OK, json!({ "success": true, "result": other })),
        Err(err) => {
            warn!(
                target: "browserd",
                request_id = meta.request_id,
                operation = %kind,
                error = %err,
                "operation failed"
            );
            (
                err.status(),
                json!({
                    "success": false,
                    "error": { "code": err.code(), "message": err.to_string() },
                }),
            )
        }
    };

    if let Value::Object(map) = &mut body {
        map.insert(
            "queue".to_string(),
            json!({
                "request_id": meta.request_id,
                "queued_position": meta.queued_position,
                "wait_ms": meta.wait_ms,
            }),
        );
    }

    let mut response = (status, Json(body)).into_response();
    let headers = response.headers_mut();
    headers.insert("x-request-id", HeaderValue::from(meta.request_id));
    headers.insert(
        "x-queue-position",
        HeaderValue::from(meta.queued_position as u64),
    );
    headers.insert("x-queue-wait-ms", HeaderValue::from(meta.wait_ms));
    response
}

/// Builds the full route table over shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/queue", get(handlers::queue_status))
        .route("/start", post(handlers::start))
        .route("/stop", post(handlers::stop))
        .route("/navigate", post(handlers::navigate))
        .route("/evaluate", post(handlers::evaluate))
        .route("/text", get(handlers::text))
        .route("/current", get(handlers::current))
        .route("/screenshot", post(handlers::screenshot))
        .route("/wait", post(handlers::wait_for))
        .route("/click", post(handlers::click))
        .route("/click/point", post(handlers::click_point))
        .route("/type", post(handlers::type_text))
        .route("/scroll", post(handlers::scroll))
        .route("/element/box", post(handlers::element_box))
        .route("/upload", post(handlers::upload))
        .route("/download/dir", post(handlers::download_dir))
        .route("/download/await", post(handlers::await_download))
        .route("/downloads", get(handlers::downloads))
        .route("/downloads/last", get(handlers::last_download))
        .route("/dialog/await", post(handlers::await_dialog))
        .route("/dialog/accept", post(handlers::dialog_accept))
        .route("/dialog/dismiss", post(handlers::dialog_dismiss))
        .route("/pages", get(handlers::pages))
        .route("/page/new", post(handlers::new_page))
        .route("/page/switch", post(handlers::switch_page))
        .route("/page/close", post(handlers::close_page))
        .route("/page/close_others", post(handlers::close_others))
        .route("/cdp/send", post(handlers::cdp_send))
        .route("/cdp/version", get(handlers::cdp_version))
        .route("/cdp/dom/text", post(handlers::cdp_dom_text))
        .route("/cdp/dom/html", post(handlers::cdp_dom_html))
        .route("/cdp/dom/attributes", post(handlers::cdp_dom_attributes))
        .route("/storage/export", post(handlers::storage_export))
        .with_state(state)
}

/// Binds the listener and serves until ctrl-c.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let engine_url = Url::parse(&cli.engine_url)
        .map_err(|e| Error::Config(format!("invalid engine url {}: {e}", cli.engine_url)))?;

    let events = Arc::new(SessionEvents::new());
    let driver = UpstreamDriver::new(engine_url)?;
    UpstreamDriver::spawn_event_pump(Arc::clone(&driver), Arc::clone(&events));

    let state = AppState::new(
        driver,
        events,
        Duration::from_millis(cli.queue_timeout_ms),
    );

    // Pick up an engine session that is already running (or auto-start one)
    // so the started gate reflects reality from the first request.
    match state.driver.status().await {
        Ok(status) => {
            let running = status
                .get("running")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            state.set_session_started(running);
            info!(target: "browserd", running, "probed engine session");
        }
        Err(err) => {
            debug!(target: "browserd", error = %err, "engine status probe failed");
        }
    }
    if cli.auto_start && !state.session_started() {
        match state.driver.start(Default::default()).await {
            Ok(_) => {
                state.set_session_started(true);
                info!(target: "browserd", "auto-started engine session");
            }
            Err(err) => warn!(target: "browserd", error = %err, "auto-start failed"),
        }
    }

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(target: "browserd", %addr, "listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!(target: "browserd", "shutting down");
        })
        .await?;
    Ok(())
}
