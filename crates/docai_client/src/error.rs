use std::fmt;

use docai_core::RequestError;
use thiserror::Error;

/// What went wrong on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFailure {
    InvalidUrl,
    /// Non-2xx response.
    HttpStatus(u16),
    /// 2xx response whose body is not the expected JSON payload.
    InvalidBody { status: u16 },
    Timeout,
    Network,
}

impl fmt::Display for TransportFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportFailure::InvalidUrl => write!(f, "invalid url"),
            TransportFailure::HttpStatus(code) => write!(f, "http status {code}"),
            TransportFailure::InvalidBody { status } => {
                write!(f, "invalid response body (http status {status})")
            }
            TransportFailure::Timeout => write!(f, "request timeout"),
            TransportFailure::Network => write!(f, "network error"),
        }
    }
}

/// HTTP-level failure, with the raw body kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} for {url}: {message}")]
pub struct TransportError {
    pub kind: TransportFailure,
    pub url: String,
    pub body: Option<String>,
    pub message: String,
}

impl TransportError {
    pub(crate) fn new(kind: TransportFailure, url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            body: None,
            message: message.into(),
        }
    }

    pub(crate) fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// HTTP status of the response, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self.kind {
            TransportFailure::HttpStatus(code) | TransportFailure::InvalidBody { status: code } => {
                Some(code)
            }
            _ => None,
        }
    }
}

/// Errors surfaced by every client operation.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The task was still running when the wait deadline passed. It keeps
    /// running server-side; polling the same id again re-attaches.
    #[error("timed out waiting for task {task_id}")]
    Timeout { task_id: String },
    /// A resolution source is missing or produced nothing usable, or the
    /// request itself is incomplete. Raised before any network call.
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("wait for task {task_id} was cancelled")]
    Cancelled { task_id: String },
}

/// Coarse discriminant for callers that branch on the error family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Transport,
    Timeout,
    Configuration,
    Cancelled,
}

impl ClientError {
    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        ClientError::Configuration(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Transport(_) => ErrorKind::Transport,
            ClientError::Timeout { .. } => ErrorKind::Timeout,
            ClientError::Configuration(_) => ErrorKind::Configuration,
            ClientError::Cancelled { .. } => ErrorKind::Cancelled,
        }
    }

    /// Task id for timeout and cancellation errors.
    pub fn task_id(&self) -> Option<&str> {
        match self {
            ClientError::Timeout { task_id } | ClientError::Cancelled { task_id } => Some(task_id),
            _ => None,
        }
    }
}

impl From<RequestError> for ClientError {
    fn from(err: RequestError) -> Self {
        ClientError::Configuration(err.to_string())
    }
}
