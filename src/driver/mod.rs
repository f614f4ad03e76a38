//! The session driver boundary.
//!
//! Everything that actually touches a browser lives behind [`SessionDriver`].
//! The relay holds exactly one driver and only ever calls it from the request
//! that currently holds the admission slot; the driver's own event hooks feed
//! the [`crate::events::SessionEvents`] latches out-of-band.

mod fake;
mod upstream;

pub use fake::FakeDriver;
pub use upstream::UpstreamDriver;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{
    CdpDomRequest, CdpSendRequest, ClickPointRequest, ClickRequest, CurrentQuery,
    DialogActionRequest, DownloadDirRequest, ElementBoxRequest, EvaluateRequest, NavigateRequest,
    NewPageRequest, ScreenshotRequest, ScrollRequest, StartRequest, StorageExportRequest,
    SwitchPageRequest, TextQuery, TypeRequest, UploadRequest, WaitRequest,
};

/// Capability surface of the one stateful browser session.
///
/// Operations return the engine's JSON payload as-is; the relay attaches its
/// own queue metadata around it. Implementations must be safe to share
/// (`Arc<dyn SessionDriver>`) but are only driven by one operation at a time.
#[async_trait]
pub trait SessionDriver: Send + Sync {
    async fn start(&self, req: StartRequest) -> Result<Value>;
    async fn stop(&self) -> Result<Value>;
    async fn status(&self) -> Result<Value>;

    async fn navigate(&self, req: NavigateRequest) -> Result<Value>;
    async fn evaluate(&self, req: EvaluateRequest) -> Result<Value>;
    async fn text(&self, query: TextQuery) -> Result<Value>;
    async fn current(&self, query: CurrentQuery) -> Result<Value>;
    async fn screenshot(&self, req: ScreenshotRequest) -> Result<Value>;
    async fn wait_for(&self, req: WaitRequest) -> Result<Value>;
    async fn click(&self, req: ClickRequest) -> Result<Value>;
    async fn click_point(&self, req: ClickPointRequest) -> Result<Value>;
    async fn type_text(&self, req: TypeRequest) -> Result<Value>;
    async fn scroll(&self, req: ScrollRequest) -> Result<Value>;
    async fn element_box(&self, req: ElementBoxRequest) -> Result<Value>;
    async fn upload(&self, req: UploadRequest) -> Result<Value>;

    async fn set_download_dir(&self, req: DownloadDirRequest) -> Result<Value>;
    async fn storage_export(&self, req: StorageExportRequest) -> Result<Value>;

    async fn cdp_send(&self, req: CdpSendRequest) -> Result<Value>;
    async fn cdp_version(&self) -> Result<Value>;
    async fn cdp_dom_text(&self, req: CdpDomRequest) -> Result<Value>;
    async fn cdp_dom_html(&self, req: CdpDomRequest) -> Result<Value>;
    async fn cdp_dom_attributes(&self, req: CdpDomRequest) -> Result<Value>;

    async fn pages(&self) -> Result<Value>;
    async fn new_page(&self, req: NewPageRequest) -> Result<Value>;
    async fn switch_page(&self, req: SwitchPageRequest) -> Result<Value>;
    async fn close_page(&self) -> Result<Value>;
    async fn close_others(&self) -> Result<Value>;

    async fn dialog_accept(&self, req: DialogActionRequest) -> Result<Value>;
    async fn dialog_dismiss(&self) -> Result<Value>;
}
