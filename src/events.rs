//! Single-slot latched mailboxes for out-of-band session events.
//!
//! Dialogs and downloads are edge-triggered: the browser raises them with no
//! temporal relationship to the HTTP call that wants to observe them. Each
//! event class gets one slot that a publish overwrites (most-recent-wins) and
//! a wait consumes, so an event that fired before the wait began is still
//! observed and a timed-out wait never swallows a payload it never saw.

use std::fmt;
use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Event classes raised by the session driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Dialog,
    Download,
}

impl fmt::Display for EventClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventClass::Dialog => f.write_str("dialog"),
            EventClass::Download => f.write_str("download"),
        }
    }
}

/// A dialog raised by the page (alert, confirm, prompt, beforeunload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    #[serde(default)]
    pub default_value: String,
}

/// A finished download, saved by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadEvent {
    pub url: String,
    pub path: Option<String>,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One-slot mailbox: publish overwrites, wait consumes, timeout leaves the
/// slot untouched.
pub struct EventLatch<T> {
    class: EventClass,
    slot: Mutex<Option<T>>,
    seq: watch::Sender<u64>,
}

impl<T: Clone> EventLatch<T> {
    pub fn new(class: EventClass) -> Self {
        Self {
            class,
            slot: Mutex::new(None),
            seq: watch::channel(0).0,
        }
    }

    /// Stores `payload`, replacing any unconsumed one, and wakes waiters.
    /// Callable at any time, including with zero waiters registered.
    pub fn publish(&self, payload: T) {
        let replaced = self.slot.lock().replace(payload).is_some();
        if replaced {
            warn!(target: "browserd.events", class = %self.class, "overwrote unconsumed event");
        } else {
            debug!(target: "browserd.events", class = %self.class, "event latched");
        }
        self.seq.send_modify(|n| *n += 1);
    }

    /// Consumes a latched payload immediately, or suspends until one is
    /// published or `timeout` elapses.
    pub async fn wait(&self, timeout: Duration) -> Result<T> {
        let started = Instant::now();
        let deadline = started + timeout;
        // Subscribe before the first check so a publish landing between the
        // check and the await still flips `changed()`.
        let mut rx = self.seq.subscribe();
        loop {
            if let Some(payload) = self.slot.lock().take() {
                return Ok(payload);
            }
            if tokio::time::timeout_at(deadline, rx.changed()).await.is_err() {
                return Err(Error::EventTimeout {
                    class: self.class,
                    waited_ms: started.elapsed().as_millis() as u64,
                });
            }
        }
    }

    /// Whether a payload is currently latched (does not consume).
    pub fn is_latched(&self) -> bool {
        self.slot.lock().is_some()
    }
}

/// Registry of the per-class latches plus the passive download history that
/// the bypass routes read without touching the driver.
pub struct SessionEvents {
    pub dialog: EventLatch<DialogEvent>,
    pub download: EventLatch<DownloadEvent>,
    history: Mutex<Vec<DownloadEvent>>,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self {
            dialog: EventLatch::new(EventClass::Dialog),
            download: EventLatch::new(EventClass::Download),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Latches a finished download and appends it to the history.
    pub fn record_download(&self, event: DownloadEvent) {
        self.history.lock().push(event.clone());
        self.download.publish(event);
    }

    pub fn downloads(&self) -> Vec<DownloadEvent> {
        self.history.lock().clone()
    }

    pub fn last_download(&self) -> Option<DownloadEvent> {
        self.history.lock().last().cloned()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download(name: &str) -> DownloadEvent {
        DownloadEvent {
            url: format!("https://example.com/{name}"),
            path: Some(format!("/tmp/{name}")),
            filename: name.to_string(),
            error: None,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn publish_before_wait_is_observed() {
        let latch = EventLatch::new(EventClass::Download);
        latch.publish(download("f.txt"));

        let got = latch.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(got.filename, "f.txt");
        assert!(!latch.is_latched());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_before_publish_is_woken() {
        let latch = std::sync::Arc::new(EventLatch::new(EventClass::Dialog));

        let waiter = {
            let latch = std::sync::Arc::clone(&latch);
            tokio::spawn(async move { latch.wait(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        latch.publish(DialogEvent {
            kind: "confirm".into(),
            message: "sure?".into(),
            default_value: String::new(),
        });

        let got = waiter.await.unwrap().unwrap();
        assert_eq!(got.message, "sure?");
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_elapses_fully_and_leaves_slot_usable() {
        let latch = EventLatch::<DialogEvent>::new(EventClass::Dialog);

        let before = Instant::now();
        let err = latch.wait(Duration::from_millis(100)).await.unwrap_err();
        let elapsed = before.elapsed();
        assert!(matches!(err, Error::EventTimeout { waited_ms, .. } if waited_ms >= 100));
        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_millis(150));

        // A publish after the timed-out wait is still observable.
        latch.publish(DialogEvent {
            kind: "alert".into(),
            message: "late".into(),
            default_value: String::new(),
        });
        let got = latch.wait(Duration::from_millis(100)).await.unwrap();
        assert_eq!(got.message, "late");
    }

    #[tokio::test(start_paused = true)]
    async fn second_publish_overwrites_first() {
        let latch = EventLatch::new(EventClass::Download);
        latch.publish(download("old.bin"));
        latch.publish(download("new.bin"));

        let got = latch.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(got.filename, "new.bin");
    }

    #[tokio::test(start_paused = true)]
    async fn history_survives_latch_consumption() {
        let events = SessionEvents::new();
        events.record_download(download("a.txt"));
        events.record_download(download("b.txt"));

        let _ = events.download.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(events.downloads().len(), 2);
        assert_eq!(events.last_download().unwrap().filename, "b.txt");
    }
}
