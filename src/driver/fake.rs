//! Scripted in-memory driver for exercising the admission and event paths
//! without a browser. Records every call, returns canned payloads, and can
//! inject latency or scripted failures per operation.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};

use super::SessionDriver;
use crate::error::{Error, Result};
use crate::types::{
    CdpDomRequest, CdpSendRequest, ClickPointRequest, ClickRequest, CurrentQuery,
    DialogActionRequest, DownloadDirRequest, ElementBoxRequest, EvaluateRequest, NavigateRequest,
    NewPageRequest, ScreenshotRequest, ScrollRequest, StartRequest, StorageExportRequest,
    SwitchPageRequest, TextQuery, TypeRequest, UploadRequest, WaitRequest,
};

#[derive(Default)]
pub struct FakeDriver {
    calls: Mutex<Vec<&'static str>>,
    responses: Mutex<HashMap<&'static str, Value>>,
    failures: Mutex<HashSet<&'static str>>,
    latency: Mutex<Option<Duration>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Operations invoked so far, in order.
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    /// Script the payload returned for `operation`.
    pub fn respond_with(&self, operation: &'static str, payload: Value) {
        self.responses.lock().insert(operation, payload);
    }

    /// Make `operation` fail with an operation error.
    pub fn fail(&self, operation: &'static str) {
        self.failures.lock().insert(operation);
    }

    /// Delay every call, to simulate a slow browser operation.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    async fn call(&self, operation: &'static str) -> Result<Value> {
        self.calls.lock().push(operation);
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.failures.lock().contains(operation) {
            return Err(Error::Operation {
                operation,
                message: "scripted failure".to_string(),
            });
        }
        let scripted = self.responses.lock().get(operation).cloned();
        Ok(scripted.unwrap_or_else(|| json!({ "success": true, "op": operation })))
    }
}

#[async_trait]
impl SessionDriver for FakeDriver {
    async fn start(&self, _req: StartRequest) -> Result<Value> {
        self.call("start").await
    }

    async fn stop(&self) -> Result<Value> {
        self.call("stop").await
    }

    async fn status(&self) -> Result<Value> {
        self.call("status").await
    }

    async fn navigate(&self, _req: NavigateRequest) -> Result<Value> {
        self.call("navigate").await
    }

    async fn evaluate(&self, _req: EvaluateRequest) -> Result<Value> {
        self.call("evaluate").await
    }

    async fn text(&self, _query: TextQuery) -> Result<Value> {
        self.call("text").await
    }

    async fn current(&self, _query: CurrentQuery) -> Result<Value> {
        self.call("current").await
    }

    async fn screenshot(&self, _req: ScreenshotRequest) -> Result<Value> {
        self.call("screenshot").await
    }

    async fn wait_for(&self, _req: WaitRequest) -> Result<Value> {
        self.call("wait_for").await
    }

    async fn click(&self, _req: ClickRequest) -> Result<Value> {
        self.call("click").await
    }

    async fn click_point(&self, _req: ClickPointRequest) -> Result<Value> {
        self.call("click_point").await
    }

    async fn type_text(&self, _req: TypeRequest) -> Result<Value> {
        self.call("type_text").await
    }

    async fn scroll(&self, _req: ScrollRequest) -> Result<Value> {
        self.call("scroll").await
    }

    async fn element_box(&self, _req: ElementBoxRequest) -> Result<Value> {
        self.call("element_box").await
    }

    async fn upload(&self, _req: UploadRequest) -> Result<Value> {
        self.call("upload").await
    }

    async fn set_download_dir(&self, _req: DownloadDirRequest) -> Result<Value> {
        self.call("download_dir").await
    }

    async fn storage_export(&self, _req: StorageExportRequest) -> Result<Value> {
        self.call("storage_export").await
    }

    async fn cdp_send(&self, _req: CdpSendRequest) -> Result<Value> {
        self.call("cdp_send").await
    }

    async fn cdp_version(&self) -> Result<Value> {
        self.call("cdp_version").await
    }

    async fn cdp_dom_text(&self, _req: CdpDomRequest) -> Result<Value> {
        self.call("cdp_dom_text").await
    }

    async fn cdp_dom_html(&self, _req: CdpDomRequest) -> Result<Value> {
        self.call("cdp_dom_html").await
    }

    async fn cdp_dom_attributes(&self, _req: CdpDomRequest) -> Result<Value> {
        self.call("cdp_dom_attributes").await
    }

    async fn pages(&self) -> Result<Value> {
        self.call("pages").await
    }

    async fn new_page(&self, _req: NewPageRequest) -> Result<Value> {
        self.call("new_page").await
    }

    async fn switch_page(&self, _req: SwitchPageRequest) -> Result<Value> {
        self.call("switch_page").await
    }

    async fn close_page(&self) -> Result<Value> {
        self.call("close_page").await
    }

    async fn close_others(&self) -> Result<Value> {
        self.call("close_others").await
    }

    async fn dialog_accept(&self, _req: DialogActionRequest) -> Result<Value> {
        self.call("dialog_accept").await
    }

    async fn dialog_dismiss(&self) -> Result<Value> {
        self.call("dialog_dismiss").await
    }
}
