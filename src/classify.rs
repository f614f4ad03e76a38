//! Operation kinds and the bypass allow-list.
//!
//! The admission machinery is agnostic to what an operation does; the only
//! question it asks is whether the kind needs exclusive session access. The
//! allow-list is fixed at build time: introspection must stay answerable
//! while a long operation holds the slot.

use std::fmt;

/// Every inbound operation kind the HTTP layer can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Root,
    Health,
    QueueStatus,
    Downloads,
    LastDownload,
    Start,
    Stop,
    Navigate,
    Evaluate,
    Text,
    Current,
    Screenshot,
    WaitFor,
    Click,
    ClickPoint,
    TypeText,
    Scroll,
    ElementBox,
    Upload,
    DownloadDir,
    AwaitDownload,
    AwaitDialog,
    DialogAccept,
    DialogDismiss,
    Pages,
    NewPage,
    SwitchPage,
    ClosePage,
    CloseOthers,
    CdpSend,
    CdpVersion,
    CdpDomText,
    CdpDomHtml,
    CdpDomAttributes,
    StorageExport,
}

impl OperationKind {
    /// Read-only-metadata kinds that skip the queue unconditionally. These
    /// consult local snapshots only, never the driver's live state.
    pub fn bypasses_queue(self) -> bool {
        matches!(
            self,
            OperationKind::Root
                | OperationKind::Health
                | OperationKind::QueueStatus
                | OperationKind::Downloads
                | OperationKind::LastDownload
        )
    }

    /// Kinds that are meaningless without a started session. Checked before
    /// a queue slot spends any session-access time on the request.
    pub fn requires_session(self) -> bool {
        !self.bypasses_queue()
            && !matches!(
                self,
                OperationKind::Start | OperationKind::Stop | OperationKind::DownloadDir
            )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Root => "root",
            OperationKind::Health => "health",
            OperationKind::QueueStatus => "queue_status",
            OperationKind::Downloads => "downloads",
            OperationKind::LastDownload => "last_download",
            OperationKind::Start => "start",
            OperationKind::Stop => "stop",
            OperationKind::Navigate => "navigate",
            OperationKind::Evaluate => "evaluate",
            OperationKind::Text => "text",
            OperationKind::Current => "current",
            OperationKind::Screenshot => "screenshot",
            OperationKind::WaitFor => "wait_for",
            OperationKind::Click => "click",
            OperationKind::ClickPoint => "click_point",
            OperationKind::TypeText => "type_text",
            OperationKind::Scroll => "scroll",
            OperationKind::ElementBox => "element_box",
            OperationKind::Upload => "upload",
            OperationKind::DownloadDir => "download_dir",
            OperationKind::AwaitDownload => "await_download",
            OperationKind::AwaitDialog => "await_dialog",
            OperationKind::DialogAccept => "dialog_accept",
            OperationKind::DialogDismiss => "dialog_dismiss",
            OperationKind::Pages => "pages",
            OperationKind::NewPage => "new_page",
            OperationKind::SwitchPage => "switch_page",
            OperationKind::ClosePage => "close_page",
            OperationKind::CloseOthers => "close_others",
            OperationKind::CdpSend => "cdp_send",
            OperationKind::CdpVersion => "cdp_version",
            OperationKind::CdpDomText => "cdp_dom_text",
            OperationKind::CdpDomHtml => "cdp_dom_html",
            OperationKind::CdpDomAttributes => "cdp_dom_attributes",
            OperationKind::StorageExport => "storage_export",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn introspection_kinds_bypass() {
        for kind in [
            OperationKind::Root,
            OperationKind::Health,
            OperationKind::QueueStatus,
            OperationKind::Downloads,
            OperationKind::LastDownload,
        ] {
            assert!(kind.bypasses_queue(), "{kind} should bypass");
            assert!(!kind.requires_session());
        }
    }

    #[test]
    fn session_mutators_queue() {
        for kind in [
            OperationKind::Navigate,
            OperationKind::Click,
            OperationKind::Screenshot,
            OperationKind::AwaitDialog,
            OperationKind::CdpSend,
            OperationKind::CdpDomText,
            OperationKind::CdpDomHtml,
            OperationKind::CdpDomAttributes,
        ] {
            assert!(!kind.bypasses_queue(), "{kind} should queue");
            assert!(kind.requires_session());
        }
    }

    #[test]
    fn start_queues_but_needs_no_session() {
        assert!(!OperationKind::Start.bypasses_queue());
        assert!(!OperationKind::Start.requires_session());
        assert!(!OperationKind::Stop.requires_session());
    }
}
