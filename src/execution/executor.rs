//! Cancellable request execution.
//!
//! `execute` runs one transport exchange on its own task and races it against
//! the caller's cancel handle, the handle's deadline and an optional per-call
//! timeout. Whatever happens, the call resolves to exactly one [`Outcome`].
//!
//! Tie-break: the completion arm is polled first, so a response that is already
//! available is delivered even if cancellation fired in the same instant. A
//! signal that fired before `execute` was entered wins without sending.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::trace;

use crate::error::CouchError;
use crate::execution::http::request::HttpRequest;
use crate::execution::http::transport::{
    ResponseBody, Transport, TransportError, TransportResponse,
};
use crate::utils::cancel::CancelHandle;

/// Why a request stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// The caller cancelled through its `CancelHandle`.
    Cancelled,
    /// The per-call timeout elapsed.
    TimedOut(Duration),
    /// The deadline attached to the `CancelHandle` passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled by caller"),
            Self::TimedOut(d) => write!(f, "timed out after {d:?}"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Terminal result of one execution attempt.
#[derive(Debug)]
pub enum Outcome {
    /// The server answered; the body is handed over unconsumed.
    Response(TransportResponse),
    /// The exchange failed below HTTP.
    TransportError(TransportError),
    /// The caller stopped waiting first.
    Cancelled(CancelReason),
}

impl Outcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    pub fn into_result(self) -> Result<TransportResponse, CouchError> {
        match self {
            Self::Response(response) => Ok(response),
            Self::TransportError(err) => Err(err.into()),
            Self::Cancelled(reason) => Err(CouchError::Cancelled(reason)),
        }
    }
}

/// Aborts the exchange task if the executing future is dropped mid-flight.
struct AbortOnDrop(JoinHandle<Result<TransportResponse, TransportError>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Instant after which an exchange is abandoned, and why.
pub(crate) type Expiry = Option<(Instant, CancelReason)>;

/// Earliest of `timeout` from now and the handle's deadline. Computed once per
/// exchange so the header wait and the body read share one budget.
pub(crate) fn expiry(cancel: &CancelHandle, timeout: Option<Duration>) -> Expiry {
    let by_timeout = timeout.map(|t| (Instant::now() + t, CancelReason::TimedOut(t)));
    let by_deadline = cancel
        .deadline()
        .map(|d| (d, CancelReason::DeadlineExceeded));
    match (by_timeout, by_deadline) {
        (Some(t), Some(d)) => Some(if d.0 <= t.0 { d } else { t }),
        (t, d) => t.or(d),
    }
}

async fn expired(expires: Expiry) -> CancelReason {
    match expires {
        Some((at, reason)) => {
            tokio::time::sleep_until(at).await;
            reason
        }
        None => std::future::pending().await,
    }
}

/// Execute one request through `transport`.
///
/// Request construction errors never reach this point; `RequestBuilder::build`
/// rejects them synchronously.
pub async fn execute(
    transport: &Arc<dyn Transport>,
    request: HttpRequest,
    cancel: &CancelHandle,
    timeout: Option<Duration>,
) -> Outcome {
    execute_until(transport, request, cancel, expiry(cancel, timeout)).await
}

/// `execute` with a precomputed expiry, for callers that keep reading the body
/// under the same budget.
pub(crate) async fn execute_until(
    transport: &Arc<dyn Transport>,
    request: HttpRequest,
    cancel: &CancelHandle,
    expires: Expiry,
) -> Outcome {
    let request_id = uuid::Uuid::new_v4();
    let method = request.method;
    let endpoint = request.endpoint.clone();

    if cancel.is_cancelled() {
        trace!(%request_id, %method, %endpoint, "cancelled before send");
        return Outcome::Cancelled(CancelReason::Cancelled);
    }
    if let Some((at, reason)) = expires
        && at <= Instant::now()
    {
        trace!(%request_id, %method, %endpoint, %reason, "expired before send");
        return Outcome::Cancelled(reason);
    }

    trace!(%request_id, %method, %endpoint, "sending request");
    let transport = Arc::clone(transport);
    let mut task = AbortOnDrop(tokio::spawn(async move { transport.send(request).await }));

    let expired = expired(expires);
    tokio::pin!(expired);

    let outcome = tokio::select! {
        biased;
        joined = &mut task.0 => match joined {
            Ok(Ok(response)) => Outcome::Response(response),
            Ok(Err(err)) => Outcome::TransportError(err),
            Err(join_err) => Outcome::TransportError(TransportError::new(format!(
                "transport task failed: {join_err}"
            ))),
        },
        _ = cancel.cancelled() => Outcome::Cancelled(CancelReason::Cancelled),
        reason = &mut expired => Outcome::Cancelled(reason),
    };

    match &outcome {
        Outcome::Response(r) => trace!(%request_id, status = r.status, "response received"),
        Outcome::TransportError(e) => trace!(%request_id, error = %e, "transport failed"),
        Outcome::Cancelled(reason) => trace!(%request_id, %reason, "request abandoned"),
    }
    outcome
}

/// Collect a response body, giving up when `cancel` fires or `expires` passes.
pub(crate) async fn collect_body(
    body: ResponseBody,
    cancel: &CancelHandle,
    expires: Expiry,
) -> Result<bytes::Bytes, CouchError> {
    tokio::select! {
        biased;
        bytes = body.bytes() => Ok(bytes?),
        _ = cancel.cancelled() => Err(CouchError::Cancelled(CancelReason::Cancelled)),
        reason = expired(expires) => Err(CouchError::Cancelled(reason)),
    }
}
