//! FIFO admission gate over the single browser session.
//!
//! Concurrent request handlers enqueue here and suspend until it is their
//! turn; exactly one admitted request may hold the session at a time. The
//! interior state is a plain mutex since nothing is held across an await;
//! wakeups flow through per-waiter [`Notify`] handles so a release can hand
//! the slot directly to the head of the line.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Serializes access to the session resource in strict enqueue order.
pub struct AdmissionQueue {
    inner: Mutex<Inner>,
}

struct Inner {
    waiting: VecDeque<Waiter>,
    current: Option<Running>,
}

struct Waiter {
    id: u64,
    notify: Arc<Notify>,
}

struct Running {
    id: u64,
    started_at: Instant,
}

/// Handle returned by [`AdmissionQueue::enqueue`]; the caller blocks on it
/// via [`AdmissionQueue::await_turn`].
pub struct Ticket {
    id: u64,
    arrival_order: usize,
    enqueued_at: Instant,
    notify: Arc<Notify>,
}

impl Ticket {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// 0-based position among waiters at the moment of enqueue.
    pub fn arrival_order(&self) -> usize {
        self.arrival_order
    }
}

/// Non-blocking snapshot of queue state, answerable while an operation runs.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    pub current_request_id: Option<u64>,
    pub queue_length: usize,
    pub waiting: bool,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                waiting: VecDeque::new(),
                current: None,
            }),
        }
    }

    /// Appends a waiter for `request_id`. Never fails; depth is unbounded.
    pub fn enqueue(&self, request_id: u64) -> Ticket {
        let mut inner = self.inner.lock();
        let arrival_order = inner.waiting.len();
        let notify = Arc::new(Notify::new());
        inner.waiting.push_back(Waiter {
            id: request_id,
            notify: Arc::clone(&notify),
        });
        debug!(
            target: "browserd.queue",
            request_id,
            position = arrival_order,
            "enqueued"
        );
        Ticket {
            id: request_id,
            arrival_order,
            enqueued_at: Instant::now(),
            notify,
        }
    }

    /// Suspends until the ticket reaches the head of the line and the slot is
    /// free, or `timeout` elapses. A timed-out waiter is removed so later
    /// waiters shift forward with no gap.
    pub async fn await_turn(
        &self,
        ticket: &Ticket,
        timeout: Duration,
    ) -> Result<AdmissionGuard<'_>> {
        let deadline = ticket.enqueued_at + timeout;
        loop {
            {
                let mut inner = self.inner.lock();
                let is_head = inner.waiting.front().is_some_and(|w| w.id == ticket.id);
                if is_head && inner.current.is_none() {
                    inner.waiting.pop_front();
                    let started_at = Instant::now();
                    inner.current = Some(Running {
                        id: ticket.id,
                        started_at,
                    });
                    let wait = started_at - ticket.enqueued_at;
                    debug!(
                        target: "browserd.queue",
                        request_id = ticket.id,
                        wait_ms = wait.as_millis() as u64,
                        "admitted"
                    );
                    return Ok(AdmissionGuard {
                        queue: self,
                        id: ticket.id,
                        wait,
                    });
                }
            }

            if tokio::time::timeout_at(deadline, ticket.notify.notified())
                .await
                .is_err()
            {
                self.abandon(ticket.id);
                let waited_ms = (Instant::now() - ticket.enqueued_at).as_millis() as u64;
                warn!(
                    target: "browserd.queue",
                    request_id = ticket.id,
                    waited_ms,
                    "gave up waiting for admission"
                );
                return Err(Error::QueueTimeout { waited_ms });
            }
        }
    }

    /// Removes a timed-out waiter. If it was the head and the slot is free
    /// (a wakeup raced the timeout), the new head is woken instead.
    fn abandon(&self, request_id: u64) {
        let mut inner = self.inner.lock();
        let Some(pos) = inner.waiting.iter().position(|w| w.id == request_id) else {
            return;
        };
        inner.waiting.remove(pos);
        if pos == 0 && inner.current.is_none() {
            if let Some(head) = inner.waiting.front() {
                head.notify.notify_one();
            }
        }
    }

    fn release(&self, request_id: u64) {
        let mut inner = self.inner.lock();
        match inner.current.take() {
            Some(running) if running.id == request_id => {
                debug!(
                    target: "browserd.queue",
                    request_id,
                    held_ms = running.started_at.elapsed().as_millis() as u64,
                    "released"
                );
            }
            other => {
                // Exactly-once release is a programming invariant; restore
                // whatever was running and flag the mismatch.
                warn!(target: "browserd.queue", request_id, "release without matching admission");
                inner.current = other;
                return;
            }
        }
        if let Some(head) = inner.waiting.front() {
            head.notify.notify_one();
        }
    }

    pub fn status(&self) -> QueueStatus {
        let inner = self.inner.lock();
        QueueStatus {
            current_request_id: inner.current.as_ref().map(|r| r.id),
            queue_length: inner.waiting.len(),
            waiting: !inner.waiting.is_empty(),
        }
    }
}

impl Default for AdmissionQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive hold on the session slot. Dropping the guard releases the slot,
/// so release fires on every exit path of the admitted operation.
pub struct AdmissionGuard<'a> {
    queue: &'a AdmissionQueue,
    id: u64,
    wait: Duration,
}

impl std::fmt::Debug for AdmissionGuard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdmissionGuard")
            .field("id", &self.id)
            .field("wait", &self.wait)
            .finish()
    }
}

impl AdmissionGuard<'_> {
    pub fn request_id(&self) -> u64 {
        self.id
    }

    /// Measured time spent waiting before admission.
    pub fn wait_ms(&self) -> u64 {
        self.wait.as_millis() as u64
    }
}

impl Drop for AdmissionGuard<'_> {
    fn drop(&mut self) {
        self.queue.release(self.id);
    }
}
