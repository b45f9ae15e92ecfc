//! HTTP transport abstraction.
//!
//! The transport performs exactly one network exchange. Connection pooling,
//! TLS and authentication belong to the implementation; everything above it
//! only sees a `TransportResponse` or a `TransportError`. Tests and callers can
//! inject their own implementation instead of going through `reqwest`.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use reqwest::header::HeaderMap;
use std::fmt;
use std::pin::Pin;

use crate::execution::http::request::HttpRequest;
use crate::response::Status;

/// Failure reported by the transport (connection refused, DNS, TLS, reset).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Streamed response body.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// Response body handed to the caller unconsumed.
pub struct ResponseBody {
    inner: BodyStream,
}

impl ResponseBody {
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, TransportError>> + Send + 'static,
    {
        Self {
            inner: Box::pin(stream),
        }
    }

    pub fn from_bytes<B: Into<Bytes>>(bytes: B) -> Self {
        let bytes = bytes.into();
        Self::from_stream(futures::stream::once(async move { Ok(bytes) }))
    }

    pub fn empty() -> Self {
        Self::from_stream(futures::stream::empty())
    }

    /// Read the whole body.
    pub async fn bytes(mut self) -> Result<Bytes, TransportError> {
        let mut buf = BytesMut::new();
        while let Some(chunk) = self.inner.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok(buf.freeze())
    }

    pub fn into_stream(self) -> BodyStream {
        self.inner
    }
}

impl fmt::Debug for ResponseBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseBody").finish_non_exhaustive()
    }
}

/// Result of one successful exchange.
#[derive(Debug)]
pub struct TransportResponse {
    pub status: u16,
    /// Status line text, e.g. `"200 OK"`
    pub status_text: String,
    /// Value of the `Server` header
    pub server: Option<String>,
    pub headers: HeaderMap,
    /// `AuthSession` cookie set by the server, if any
    pub session: Option<String>,
    pub body: ResponseBody,
}

impl TransportResponse {
    /// A response with the canonical status text and no headers.
    pub fn new(status: u16, body: ResponseBody) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("");
        Self {
            status,
            status_text: format!("{status} {reason}").trim_end().to_string(),
            server: None,
            headers: HeaderMap::new(),
            session: None,
            body,
        }
    }

    pub fn status(&self) -> Status {
        Status {
            code: self.status,
            status: self.status_text.clone(),
            server: self.server.clone(),
        }
    }
}

/// Custom HTTP transport.
///
/// `send` performs one exchange and must not retry. It is called on a spawned
/// task, and the task is aborted when the caller cancels.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<TransportResponse, TransportError>;
}
