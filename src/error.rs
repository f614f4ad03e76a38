//! Error taxonomy for the relay.
//!
//! The three timeout/failure families stay distinct end to end so callers can
//! tell "the system is busy" (queue timeout) from "the event never came"
//! (event timeout) from "the operation itself failed".

use axum::http::StatusCode;

use crate::events::EventClass;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The wait for admission exceeded its bound; the request never touched
    /// the session.
    #[error("queue wait timed out after {waited_ms}ms")]
    QueueTimeout { waited_ms: u64 },

    /// An event wait expired inside an admitted, running operation.
    #[error("no {class} event within {waited_ms}ms")]
    EventTimeout { class: EventClass, waited_ms: u64 },

    #[error("browser not started; call POST /start first")]
    SessionNotStarted,

    /// The engine reported a failure for an admitted operation.
    #[error("{operation} failed: {message}")]
    Operation {
        operation: &'static str,
        message: String,
    },

    /// Transport-level failure talking to the engine.
    #[error("engine request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The engine says the target does not exist (page index, dialog, file).
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Stable machine-readable code carried in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::QueueTimeout { .. } => "queue_timeout",
            Error::EventTimeout { .. } => "event_timeout",
            Error::SessionNotStarted => "session_not_started",
            Error::Operation { .. } => "operation_failed",
            Error::Upstream(_) => "engine_unreachable",
            Error::NotFound(_) => "not_found",
            Error::Config(_) | Error::Io(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::QueueTimeout { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::EventTimeout { .. } => StatusCode::REQUEST_TIMEOUT,
            Error::SessionNotStarted => StatusCode::BAD_REQUEST,
            Error::Operation { .. } | Error::Upstream(_) => StatusCode::BAD_GATEWAY,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Config(_) | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
