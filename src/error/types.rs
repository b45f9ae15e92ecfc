//! Core error types.

use thiserror::Error;

use crate::execution::executor::CancelReason;
use crate::response::Status;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CouchError>;

/// Errors produced by the client.
#[derive(Error, Debug, Clone)]
pub enum CouchError {
    /// Network, DNS or TLS failure reported by the transport, message verbatim.
    #[error("transport error: {0}")]
    Transport(String),

    /// The caller gave up waiting before the server answered.
    #[error("request cancelled: {0}")]
    Cancelled(CancelReason),

    /// The server answered with a status >= 400.
    #[error("{} {error}: {reason}", .status.code)]
    Api {
        status: Status,
        error: String,
        reason: String,
    },

    /// A payload could not be decoded into the requested shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// `decode` was called without a document under the cursor.
    #[error("no current document, call advance first")]
    NoCurrentDocument,

    /// The cursor was closed by the caller.
    #[error("cursor already closed")]
    CursorClosed,

    /// A one-shot response body was already read.
    #[error("response body already consumed")]
    AlreadyConsumed,

    /// The request could not be constructed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Caller supplied an unusable argument.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Client configuration is invalid.
    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Coarse classification of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transport,
    Cancellation,
    Protocol,
    Decode,
    Usage,
}

impl CouchError {
    /// Build an `Api` error from a status and the remote error body.
    ///
    /// CouchDB error bodies look like `{"error": "not_found", "reason": "missing"}`;
    /// anything else is kept as the reason text.
    pub fn from_response(status: Status, body: &[u8]) -> Self {
        #[derive(serde::Deserialize)]
        struct RemoteError {
            #[serde(default)]
            error: String,
            #[serde(default)]
            reason: String,
        }

        let (error, reason) = match serde_json::from_slice::<RemoteError>(body) {
            Ok(remote) => (remote.error, remote.reason),
            Err(_) => (
                status.status.clone(),
                String::from_utf8_lossy(body).trim().to_string(),
            ),
        };
        Self::Api {
            status,
            error,
            reason,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Transport(_) => ErrorCategory::Transport,
            Self::Cancelled(_) => ErrorCategory::Cancellation,
            Self::Api { .. } => ErrorCategory::Protocol,
            Self::Decode(_) | Self::NoCurrentDocument => ErrorCategory::Decode,
            Self::CursorClosed
            | Self::AlreadyConsumed
            | Self::InvalidRequest(_)
            | Self::InvalidInput(_)
            | Self::Configuration(_) => ErrorCategory::Usage,
        }
    }

    /// HTTP status code for protocol errors.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(status.code),
            _ => None,
        }
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}
