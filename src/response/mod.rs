//! Result wrappers
//!
//! Every response carries a [`Status`]. Single-document responses expose a
//! one-shot [`SingleResult::decode`]; `_find` responses expose a [`Cursor`].

use serde::de::DeserializeOwned;

use crate::error::CouchError;
use crate::execution::http::transport::{ResponseBody, TransportResponse};
use crate::streaming::cursor::Cursor;

/// Status line and server identification of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: u16,
    /// Status line text, e.g. `"201 Created"`
    pub status: String,
    /// Value of the `Server` header
    pub server: Option<String>,
}

impl Status {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_error(&self) -> bool {
        self.code >= 400
    }
}

/// Response holding a single JSON body.
#[derive(Debug)]
pub struct SingleResult {
    status: Status,
    session: Option<String>,
    body: Option<ResponseBody>,
}

impl SingleResult {
    pub fn new(status: Status, body: ResponseBody, session: Option<String>) -> Self {
        Self {
            status,
            session,
            body: Some(body),
        }
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    /// `AuthSession` cookie returned with this response.
    pub fn session_cookie(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Read the raw body. The body can be read once.
    pub async fn bytes(&mut self) -> Result<bytes::Bytes, CouchError> {
        let body = self.body.take().ok_or(CouchError::AlreadyConsumed)?;
        Ok(body.bytes().await?)
    }

    /// Read the body and deserialize it into `T`. The body can be read once;
    /// a second call fails with `CouchError::AlreadyConsumed`.
    pub async fn decode<T: DeserializeOwned>(&mut self) -> Result<T, CouchError> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl From<TransportResponse> for SingleResult {
    fn from(response: TransportResponse) -> Self {
        let status = response.status();
        Self::new(status, response.body, response.session)
    }
}

/// Response of a paginated query.
#[derive(Debug)]
pub struct MultiResult {
    status: Status,
    session: Option<String>,
    cursor: Cursor,
}

impl MultiResult {
    pub fn new(status: Status, cursor: Cursor, session: Option<String>) -> Self {
        Self {
            status,
            session,
            cursor,
        }
    }

    /// Status of the first page request.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// `AuthSession` cookie returned with the first page.
    pub fn session_cookie(&self) -> Option<&str> {
        self.session.as_deref()
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    pub fn into_cursor(self) -> Cursor {
        self.cursor
    }

    pub fn into_parts(self) -> (Status, Cursor) {
        (self.status, self.cursor)
    }
}
