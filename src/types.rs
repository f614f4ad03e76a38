//! Request payloads accepted by the HTTP layer and forwarded to the driver.
//!
//! Defaults mirror the engine's own: navigation settles on network idle with
//! a generous timeout, interaction timeouts are tighter.

use serde::{Deserialize, Serialize};

fn default_wait_until() -> String {
    "networkidle".to_string()
}

fn default_navigate_timeout() -> u64 {
    60_000
}

fn default_extra_wait_ms() -> u64 {
    3_000
}

fn default_eval_timeout() -> u64 {
    30_000
}

fn default_interact_timeout() -> u64 {
    10_000
}

fn default_true() -> bool {
    true
}

fn default_direction() -> String {
    "down".to_string()
}

fn default_button() -> String {
    "left".to_string()
}

fn default_clicks() -> u32 {
    1
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartRequest {
    pub headless: Option<bool>,
    pub user_data_dir: Option<String>,
    pub user_agent: Option<String>,
    pub channel: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigateRequest {
    pub url: String,
    #[serde(default = "default_wait_until")]
    pub wait_until: String,
    #[serde(default = "default_navigate_timeout")]
    pub timeout: u64,
    #[serde(default = "default_extra_wait_ms")]
    pub extra_wait_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub script: String,
    pub args: Option<Vec<serde_json::Value>>,
    #[serde(default = "default_eval_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextQuery {
    pub selector: Option<String>,
    #[serde(default = "default_eval_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentQuery {
    #[serde(default)]
    pub include_html: bool,
    #[serde(default)]
    pub include_text: bool,
    pub selector: Option<String>,
    #[serde(default = "default_eval_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotRequest {
    #[serde(default = "default_true")]
    pub full_page: bool,
    pub selector: Option<String>,
    #[serde(default = "default_navigate_timeout")]
    pub timeout: u64,
}

impl Default for ScreenshotRequest {
    fn default() -> Self {
        Self {
            full_page: true,
            selector: None,
            timeout: default_navigate_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitRequest {
    pub selector: Option<String>,
    pub text: Option<String>,
    #[serde(default = "default_eval_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickRequest {
    pub selector: String,
    #[serde(default = "default_interact_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClickPointRequest {
    pub x: f64,
    pub y: f64,
    #[serde(default = "default_button")]
    pub button: String,
    #[serde(default = "default_clicks")]
    pub clicks: u32,
    #[serde(default)]
    pub delay: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeRequest {
    pub selector: String,
    pub text: String,
    #[serde(default = "default_interact_timeout")]
    pub timeout: u64,
    #[serde(default = "default_true")]
    pub clear_first: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollRequest {
    #[serde(default = "default_direction")]
    pub direction: String,
    #[serde(default)]
    pub to_bottom: bool,
    pub amount: Option<i64>,
}

impl Default for ScrollRequest {
    fn default() -> Self {
        Self {
            direction: default_direction(),
            to_bottom: false,
            amount: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementBoxRequest {
    pub selector: String,
    #[serde(default = "default_eval_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    pub selector: String,
    pub paths: Vec<String>,
    #[serde(default = "default_eval_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DownloadDirRequest {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageExportRequest {
    pub path: Option<String>,
    #[serde(default)]
    pub include_json: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPageRequest {
    pub url: Option<String>,
    #[serde(default = "default_wait_until")]
    pub wait_until: String,
    #[serde(default = "default_navigate_timeout")]
    pub timeout: u64,
    #[serde(default = "default_extra_wait_ms")]
    pub extra_wait_ms: u64,
}

impl Default for NewPageRequest {
    fn default() -> Self {
        Self {
            url: None,
            wait_until: default_wait_until(),
            timeout: default_navigate_timeout(),
            extra_wait_ms: default_extra_wait_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwitchPageRequest {
    pub id: usize,
}

/// Selector-addressed DOM lookup resolved through a CDP session (text,
/// outer HTML, attributes).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdpDomRequest {
    pub selector: String,
    #[serde(default = "default_eval_timeout")]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CdpSendRequest {
    pub method: String,
    pub params: Option<serde_json::Value>,
    #[serde(default = "default_eval_timeout")]
    pub timeout: u64,
}

/// How to resolve an observed dialog in the same operation as the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogAction {
    Accept,
    Dismiss,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogWaitRequest {
    #[serde(default = "default_eval_timeout")]
    pub timeout: u64,
    pub action: Option<DialogAction>,
    pub prompt_text: Option<String>,
}

impl Default for DialogWaitRequest {
    fn default() -> Self {
        Self {
            timeout: default_eval_timeout(),
            action: None,
            prompt_text: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogActionRequest {
    pub prompt_text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadWaitRequest {
    #[serde(default = "default_eval_timeout")]
    pub timeout: u64,
}

impl Default for DownloadWaitRequest {
    fn default() -> Self {
        Self {
            timeout: default_eval_timeout(),
        }
    }
}
