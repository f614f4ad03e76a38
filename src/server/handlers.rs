//! Route handlers. Each one classifies its operation kind and hands the
//! driver call to [`execute`](super::execute); the bypass handlers consult
//! local snapshots only so they stay answerable while the queue is deep.

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::extract::{Query, State};
use axum::response::Response;
use serde_json::json;

use super::extract::OptionalJson;
use super::{AppState, execute};
use crate::classify::OperationKind;
use crate::types::{
    CdpDomRequest, CdpSendRequest, ClickPointRequest, ClickRequest, CurrentQuery, DialogAction,
    DialogActionRequest, DialogWaitRequest, DownloadDirRequest, DownloadWaitRequest,
    ElementBoxRequest, EvaluateRequest, NavigateRequest, NewPageRequest, ScreenshotRequest,
    ScrollRequest, StartRequest, StorageExportRequest, SwitchPageRequest, TextQuery, TypeRequest,
    UploadRequest, WaitRequest,
};

pub async fn root(State(state): State<Arc<AppState>>) -> Response {
    let st = Arc::clone(&state);
    execute(state, OperationKind::Root, move || async move {
        Ok(json!({
            "service": "browserd",
            "version": env!("CARGO_PKG_VERSION"),
            "status": "running",
            "session": { "running": st.session_started() },
            "queue_status": st.queue.status(),
        }))
    })
    .await
}

pub async fn health(State(state): State<Arc<AppState>>) -> Response {
    let st = Arc::clone(&state);
    execute(state, OperationKind::Health, move || async move {
        Ok(json!({
            "running": st.session_started(),
            "queue_status": st.queue.status(),
        }))
    })
    .await
}

pub async fn queue_status(State(state): State<Arc<AppState>>) -> Response {
    let st = Arc::clone(&state);
    execute(state, OperationKind::QueueStatus, move || async move {
        let status = st.queue.status();
        Ok(json!({ "success": true, "queue_status": status }))
    })
    .await
}

pub async fn downloads(State(state): State<Arc<AppState>>) -> Response {
    let st = Arc::clone(&state);
    execute(state, OperationKind::Downloads, move || async move {
        Ok(json!({ "success": true, "downloads": st.events.downloads() }))
    })
    .await
}

pub async fn last_download(State(state): State<Arc<AppState>>) -> Response {
    let st = Arc::clone(&state);
    execute(state, OperationKind::LastDownload, move || async move {
        Ok(json!({ "success": true, "download": st.events.last_download() }))
    })
    .await
}

pub async fn start(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<StartRequest>,
) -> Response {
    let st = Arc::clone(&state);
    execute(state, OperationKind::Start, move || async move {
        let value = st.driver.start(req).await?;
        st.set_session_started(true);
        Ok(value)
    })
    .await
}

pub async fn stop(State(state): State<Arc<AppState>>) -> Response {
    let st = Arc::clone(&state);
    execute(state, OperationKind::Stop, move || async move {
        let value = st.driver.stop().await?;
        st.set_session_started(false);
        Ok(value)
    })
    .await
}

pub async fn navigate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<NavigateRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::Navigate, move || async move {
        driver.navigate(req).await
    })
    .await
}

pub async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluateRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::Evaluate, move || async move {
        driver.evaluate(req).await
    })
    .await
}

pub async fn text(State(state): State<Arc<AppState>>, Query(query): Query<TextQuery>) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::Text, move || async move {
        driver.text(query).await
    })
    .await
}

pub async fn current(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CurrentQuery>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::Current, move || async move {
        driver.current(query).await
    })
    .await
}

pub async fn screenshot(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<ScreenshotRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::Screenshot, move || async move {
        driver.screenshot(req).await
    })
    .await
}

pub async fn wait_for(State(state): State<Arc<AppState>>, Json(req): Json<WaitRequest>) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::WaitFor, move || async move {
        driver.wait_for(req).await
    })
    .await
}

pub async fn click(State(state): State<Arc<AppState>>, Json(req): Json<ClickRequest>) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::Click, move || async move {
        driver.click(req).await
    })
    .await
}

pub async fn click_point(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ClickPointRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::ClickPoint, move || async move {
        driver.click_point(req).await
    })
    .await
}

pub async fn type_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TypeRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::TypeText, move || async move {
        driver.type_text(req).await
    })
    .await
}

pub async fn scroll(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<ScrollRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::Scroll, move || async move {
        driver.scroll(req).await
    })
    .await
}

pub async fn element_box(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ElementBoxRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::ElementBox, move || async move {
        driver.element_box(req).await
    })
    .await
}

pub async fn upload(State(state): State<Arc<AppState>>, Json(req): Json<UploadRequest>) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::Upload, move || async move {
        driver.upload(req).await
    })
    .await
}

pub async fn download_dir(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<DownloadDirRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::DownloadDir, move || async move {
        driver.set_download_dir(req).await
    })
    .await
}

/// Blocks inside its admission slot until the next download finishes or the
/// bound elapses. A download that completed before this call is still
/// observed via the latch.
pub async fn await_download(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<DownloadWaitRequest>,
) -> Response {
    let st = Arc::clone(&state);
    execute(state, OperationKind::AwaitDownload, move || async move {
        let timeout = Duration::from_millis(req.timeout.max(1));
        let download = st.events.download.wait(timeout).await?;
        Ok(json!({ "success": true, "download": download }))
    })
    .await
}

/// Blocks for the next dialog; optionally resolves it (accept/dismiss) in
/// the same operation.
pub async fn await_dialog(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<DialogWaitRequest>,
) -> Response {
    let st = Arc::clone(&state);
    execute(state, OperationKind::AwaitDialog, move || async move {
        let timeout = Duration::from_millis(req.timeout.max(1));
        let dialog = st.events.dialog.wait(timeout).await?;
        match req.action {
            Some(DialogAction::Accept) => {
                st.driver
                    .dialog_accept(DialogActionRequest {
                        prompt_text: req.prompt_text,
                    })
                    .await?;
                Ok(json!({ "success": true, "handled": "accept", "dialog": dialog }))
            }
            Some(DialogAction::Dismiss) => {
                st.driver.dialog_dismiss().await?;
                Ok(json!({ "success": true, "handled": "dismiss", "dialog": dialog }))
            }
            None => Ok(json!({ "success": true, "dialog": dialog })),
        }
    })
    .await
}

pub async fn dialog_accept(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<DialogActionRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::DialogAccept, move || async move {
        driver.dialog_accept(req).await
    })
    .await
}

pub async fn dialog_dismiss(State(state): State<Arc<AppState>>) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::DialogDismiss, move || async move {
        driver.dialog_dismiss().await
    })
    .await
}

pub async fn pages(State(state): State<Arc<AppState>>) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::Pages, move || async move {
        driver.pages().await
    })
    .await
}

pub async fn new_page(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<NewPageRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::NewPage, move || async move {
        driver.new_page(req).await
    })
    .await
}

pub async fn switch_page(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SwitchPageRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::SwitchPage, move || async move {
        driver.switch_page(req).await
    })
    .await
}

pub async fn close_page(State(state): State<Arc<AppState>>) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::ClosePage, move || async move {
        driver.close_page().await
    })
    .await
}

pub async fn close_others(State(state): State<Arc<AppState>>) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::CloseOthers, move || async move {
        driver.close_others().await
    })
    .await
}

pub async fn cdp_send(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CdpSendRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::CdpSend, move || async move {
        driver.cdp_send(req).await
    })
    .await
}

pub async fn cdp_version(State(state): State<Arc<AppState>>) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::CdpVersion, move || async move {
        driver.cdp_version().await
    })
    .await
}

pub async fn cdp_dom_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CdpDomRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::CdpDomText, move || async move {
        driver.cdp_dom_text(req).await
    })
    .await
}

pub async fn cdp_dom_html(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CdpDomRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::CdpDomHtml, move || async move {
        driver.cdp_dom_html(req).await
    })
    .await
}

pub async fn cdp_dom_attributes(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CdpDomRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::CdpDomAttributes, move || async move {
        driver.cdp_dom_attributes(req).await
    })
    .await
}

pub async fn storage_export(
    State(state): State<Arc<AppState>>,
    OptionalJson(req): OptionalJson<StorageExportRequest>,
) -> Response {
    let driver = Arc::clone(&state.driver);
    execute(state, OperationKind::StorageExport, move || async move {
        driver.storage_export(req).await
    })
    .await
}
