//! One page of a `_find` query.

use serde::Deserialize;
use serde_json::value::RawValue;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::CouchError;
use crate::execution::executor::{collect_body, execute_until, expiry};
use crate::execution::http::request::{Method, RequestBuilder};
use crate::execution::http::transport::Transport;
use crate::response::Status;
use crate::types::QueryDescriptor;
use crate::utils::cancel::CancelHandle;

/// Decoded `_find` response body. Documents stay undecoded.
#[derive(Debug, Deserialize)]
pub struct PageEnvelope {
    pub docs: Box<RawValue>,
    #[serde(default)]
    pub bookmark: String,
    #[serde(default)]
    pub warning: Option<String>,
    #[serde(default)]
    pub execution_stats: Option<serde_json::Map<String, serde_json::Value>>,
    /// `AuthSession` cookie sent along with this page.
    #[serde(skip)]
    pub session: Option<String>,
}

impl PageEnvelope {
    pub fn from_slice(body: &[u8]) -> Result<Self, CouchError> {
        serde_json::from_slice(body)
            .map_err(|e| CouchError::Decode(format!("invalid query response: {e}")))
    }

    /// `execution_stats.results_returned`, present only when statistics were
    /// requested.
    pub fn results_returned(&self) -> Option<u64> {
        self.execution_stats
            .as_ref()?
            .get("results_returned")?
            .as_u64()
    }
}

/// Issues page requests for one query endpoint. Holds no query state.
#[derive(Clone)]
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    endpoint: String,
    timeout: Option<Duration>,
}

impl fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageFetcher")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl PageFetcher {
    pub fn new<S: Into<String>>(
        transport: Arc<dyn Transport>,
        endpoint: S,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            timeout,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST `descriptor` and decode the envelope of the answer.
    ///
    /// Status >= 400 is returned as `CouchError::Api` with the server's
    /// message; a body that is not an envelope is a `CouchError::Decode`.
    pub async fn fetch_page(
        &self,
        descriptor: &QueryDescriptor,
        cancel: &CancelHandle,
    ) -> Result<(Status, PageEnvelope), CouchError> {
        let request = RequestBuilder::new()
            .method(Method::Post)
            .endpoint(self.endpoint.as_str())
            .json(descriptor)
            .build()?;

        let expires = expiry(cancel, self.timeout);
        let response = execute_until(&self.transport, request, cancel, expires)
            .await
            .into_result()?;
        let status = response.status();
        let session = response.session;
        let body = collect_body(response.body, cancel, expires).await?;

        if status.is_error() {
            return Err(CouchError::from_response(status, &body));
        }

        let mut envelope = PageEnvelope::from_slice(&body)?;
        envelope.session = session;
        debug!(
            endpoint = %self.endpoint,
            requested_bookmark = %descriptor.bookmark,
            bookmark = %envelope.bookmark,
            warning = envelope.warning.as_deref().unwrap_or(""),
            "fetched query page"
        );
        Ok((status, envelope))
    }
}
