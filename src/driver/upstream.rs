//! Driver that forwards operations to the automation engine over HTTP.
//!
//! The engine owns the actual browser process; this driver is a thin client
//! that relays each admitted operation and translates non-2xx replies into
//! typed errors. Out-of-band notifications (dialogs appearing, downloads
//! finishing) arrive on the engine's `/events` NDJSON stream; a background
//! pump reads that stream for the lifetime of the process and publishes into
//! the event latches, reconnecting with backoff when the stream drops.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};
use url::Url;

use super::SessionDriver;
use crate::error::{Error, Result};
use crate::events::{DialogEvent, DownloadEvent, SessionEvents};
use crate::types::{
    CdpDomRequest, CdpSendRequest, ClickPointRequest, ClickRequest, CurrentQuery,
    DialogActionRequest, DownloadDirRequest, ElementBoxRequest, EvaluateRequest, NavigateRequest,
    NewPageRequest, ScreenshotRequest, ScrollRequest, StartRequest, StorageExportRequest,
    SwitchPageRequest, TextQuery, TypeRequest, UploadRequest, WaitRequest,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const PUMP_BACKOFF_MIN: Duration = Duration::from_secs(1);
const PUMP_BACKOFF_MAX: Duration = Duration::from_secs(30);

pub struct UpstreamDriver {
    http: reqwest::Client,
    base: Url,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "class", content = "payload", rename_all = "snake_case")]
enum EngineEvent {
    Dialog(DialogEvent),
    Download(DownloadEvent),
}

impl UpstreamDriver {
    pub fn new(mut base: Url) -> Result<Arc<Self>> {
        // Joining absolute paths would discard a path-mounted engine prefix
        // (e.g. http://host/api); keep the base directory-like instead.
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(Error::Upstream)?;
        Ok(Arc::new(Self { http, base }))
    }

    /// Starts the event pump feeding `events` for the process lifetime.
    pub fn spawn_event_pump(driver: Arc<Self>, events: Arc<SessionEvents>) {
        tokio::spawn(async move {
            let mut backoff = PUMP_BACKOFF_MIN;
            loop {
                match driver.pump_events(&events).await {
                    Ok(()) => {
                        debug!(target: "browserd.events", "engine event stream ended");
                        backoff = PUMP_BACKOFF_MIN;
                    }
                    Err(err) => {
                        warn!(
                            target: "browserd.events",
                            error = %err,
                            retry_in_s = backoff.as_secs(),
                            "engine event stream unavailable"
                        );
                    }
                }
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(PUMP_BACKOFF_MAX);
            }
        });
    }

    async fn pump_events(&self, events: &SessionEvents) -> Result<()> {
        let url = self.endpoint("/events")?;
        let response = self.http.get(url).send().await?.error_for_status()?;
        info!(target: "browserd.events", "connected to engine event stream");

        let mut stream = response.bytes_stream();
        let mut buf = Vec::new();
        while let Some(chunk) = stream.next().await {
            buf.extend_from_slice(&chunk?);
            while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buf.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&line);
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<EngineEvent>(line) {
                    Ok(EngineEvent::Dialog(dialog)) => events.dialog.publish(dialog),
                    Ok(EngineEvent::Download(download)) => events.record_download(download),
                    Err(err) => {
                        warn!(target: "browserd.events", error = %err, "unparseable engine event")
                    }
                }
            }
        }
        Ok(())
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::Config(format!("bad engine path {path}: {e}")))
    }

    async fn post<B: serde::Serialize + Sync>(
        &self,
        operation: &'static str,
        path: &str,
        body: &B,
    ) -> Result<Value> {
        let url = self.endpoint(path)?;
        let response = self.http.post(url).json(body).send().await?;
        Self::interpret(operation, response).await
    }

    async fn get(
        &self,
        operation: &'static str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Value> {
        let url = self.endpoint(path)?;
        let response = self.http.get(url).query(query).send().await?;
        Self::interpret(operation, response).await
    }

    async fn interpret(operation: &'static str, response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let text = response.text().await?;
        let body: Value =
            serde_json::from_str(&text).unwrap_or_else(|_| json!({ "detail": text }));

        if status.is_success() {
            return Ok(body);
        }

        let message = body
            .get("detail")
            .and_then(Value::as_str)
            .unwrap_or(text.as_str())
            .to_string();
        debug!(
            target: "browserd",
            operation,
            status = status.as_u16(),
            %message,
            "engine rejected operation"
        );

        if status == reqwest::StatusCode::BAD_REQUEST
            && message.to_lowercase().contains("not started")
        {
            return Err(Error::SessionNotStarted);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(message));
        }
        Err(Error::Operation { operation, message })
    }
}

#[async_trait]
impl SessionDriver for UpstreamDriver {
    async fn start(&self, req: StartRequest) -> Result<Value> {
        self.post("start", "/start", &req).await
    }

    async fn stop(&self) -> Result<Value> {
        self.post("stop", "/stop", &json!({})).await
    }

    async fn status(&self) -> Result<Value> {
        self.get("status", "/health", &[]).await
    }

    async fn navigate(&self, req: NavigateRequest) -> Result<Value> {
        self.post("navigate", "/navigate", &req).await
    }

    async fn evaluate(&self, req: EvaluateRequest) -> Result<Value> {
        self.post("evaluate", "/evaluate", &req).await
    }

    async fn text(&self, query: TextQuery) -> Result<Value> {
        let mut params = vec![("timeout", query.timeout.to_string())];
        if let Some(selector) = query.selector {
            params.push(("selector", selector));
        }
        self.get("text", "/text", &params).await
    }

    async fn current(&self, query: CurrentQuery) -> Result<Value> {
        let mut params = vec![
            ("include_html", query.include_html.to_string()),
            ("include_text", query.include_text.to_string()),
            ("timeout", query.timeout.to_string()),
        ];
        if let Some(selector) = query.selector {
            params.push(("selector", selector));
        }
        self.get("current", "/current", &params).await
    }

    async fn screenshot(&self, req: ScreenshotRequest) -> Result<Value> {
        self.post("screenshot", "/screenshot", &req).await
    }

    async fn wait_for(&self, req: WaitRequest) -> Result<Value> {
        self.post("wait_for", "/wait", &req).await
    }

    async fn click(&self, req: ClickRequest) -> Result<Value> {
        self.post("click", "/click", &req).await
    }

    async fn click_point(&self, req: ClickPointRequest) -> Result<Value> {
        self.post("click_point", "/click/point", &req).await
    }

    async fn type_text(&self, req: TypeRequest) -> Result<Value> {
        self.post("type_text", "/type", &req).await
    }

    async fn scroll(&self, req: ScrollRequest) -> Result<Value> {
        self.post("scroll", "/scroll", &req).await
    }

    async fn element_box(&self, req: ElementBoxRequest) -> Result<Value> {
        self.post("element_box", "/element/box", &req).await
    }

    async fn upload(&self, req: UploadRequest) -> Result<Value> {
        self.post("upload", "/upload", &req).await
    }

    async fn set_download_dir(&self, req: DownloadDirRequest) -> Result<Value> {
        self.post("download_dir", "/download/dir", &req).await
    }

    async fn storage_export(&self, req: StorageExportRequest) -> Result<Value> {
        self.post("storage_export", "/storage/export", &req).await
    }

    async fn cdp_send(&self, req: CdpSendRequest) -> Result<Value> {
        self.post("cdp_send", "/cdp/send", &req).await
    }

    async fn cdp_version(&self) -> Result<Value> {
        self.get("cdp_version", "/cdp/version", &[]).await
    }

    async fn cdp_dom_text(&self, req: CdpDomRequest) -> Result<Value> {
        self.post("cdp_dom_text", "/cdp/dom/text", &req).await
    }

    async fn cdp_dom_html(&self, req: CdpDomRequest) -> Result<Value> {
        self.post("cdp_dom_html", "/cdp/dom/html", &req).await
    }

    async fn cdp_dom_attributes(&self, req: CdpDomRequest) -> Result<Value> {
        self.post("cdp_dom_attributes", "/cdp/dom/attributes", &req)
            .await
    }

    async fn pages(&self) -> Result<Value> {
        self.get("pages", "/pages", &[]).await
    }

    async fn new_page(&self, req: NewPageRequest) -> Result<Value> {
        self.post("new_page", "/page/new", &req).await
    }

    async fn switch_page(&self, req: SwitchPageRequest) -> Result<Value> {
        self.post("switch_page", "/page/switch", &req).await
    }

    async fn close_page(&self) -> Result<Value> {
        self.post("close_page", "/page/close", &json!({})).await
    }

    async fn close_others(&self) -> Result<Value> {
        self.post("close_others", "/page/close_others", &json!({}))
            .await
    }

    async fn dialog_accept(&self, req: DialogActionRequest) -> Result<Value> {
        self.post("dialog_accept", "/dialog/accept", &req).await
    }

    async fn dialog_dismiss(&self) -> Result<Value> {
        self.post("dialog_dismiss", "/dialog/dismiss", &json!({}))
            .await
    }
}
