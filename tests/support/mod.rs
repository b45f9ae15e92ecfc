//! Scripted in-memory transport shared by the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use couchdb_client::execution::http::request::HttpRequest;
use couchdb_client::execution::http::transport::{
    ResponseBody, Transport, TransportError, TransportResponse,
};

/// Route the crate's logs to the test output; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// What the transport does with the next request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// 200 with the given body.
    Ok(String),
    /// Any status with the given body.
    Status(u16, String),
    /// Fail below HTTP with the given message.
    Fail(String),
    /// Never answer.
    Hang,
    /// 200 whose body sends the given prefix and then stalls.
    Stall(String),
}

/// Drops to count abandoned exchanges.
struct Abandoned(Arc<AtomicUsize>);

impl Drop for Abandoned {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Replays a fixed script of replies and records every request body.
///
/// Requests beyond the script are refused.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
    sent: Notify,
    abandoned: Arc<AtomicUsize>,
}

impl ScriptedTransport {
    pub fn new<I: IntoIterator<Item = Reply>>(replies: I) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Default::default()
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// JSON bodies of every request, in order.
    pub fn bodies(&self) -> Vec<serde_json::Value> {
        self.requests()
            .iter()
            .map(|r| serde_json::from_slice(&r.body).expect("json request body"))
            .collect()
    }

    /// Bookmark sent with each request; `None` when the field was omitted.
    pub fn bookmarks(&self) -> Vec<Option<String>> {
        self.bodies()
            .iter()
            .map(|b| b.get("bookmark").and_then(|v| v.as_str()).map(str::to_string))
            .collect()
    }

    /// Number of hanging exchanges that were dropped.
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    /// Wait until at least `n` requests have been received.
    pub async fn wait_for_requests(&self, n: usize) {
        loop {
            let notified = self.sent.notified();
            if self.request_count() >= n {
                return;
            }
            notified.await;
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        let reply = self.replies.lock().unwrap().pop_front();
        self.sent.notify_waiters();

        match reply {
            Some(Reply::Ok(body)) => Ok(TransportResponse::new(200, ResponseBody::from_bytes(body))),
            Some(Reply::Status(status, body)) => {
                Ok(TransportResponse::new(status, ResponseBody::from_bytes(body)))
            }
            Some(Reply::Fail(message)) => Err(TransportError::new(message)),
            Some(Reply::Stall(prefix)) => {
                use futures::StreamExt;
                let first = futures::stream::once(async move { Ok(bytes::Bytes::from(prefix)) });
                Ok(TransportResponse::new(
                    200,
                    ResponseBody::from_stream(first.chain(futures::stream::pending())),
                ))
            }
            Some(Reply::Hang) => {
                let _guard = Abandoned(self.abandoned.clone());
                std::future::pending().await
            }
            None => Err(TransportError::new("connection refused")),
        }
    }
}

/// A `_find` page whose documents are `{"_id": id, "seq": n}`.
pub fn page(ids: &[&str], bookmark: &str) -> Reply {
    let docs: Vec<_> = ids
        .iter()
        .enumerate()
        .map(|(seq, id)| serde_json::json!({ "_id": id, "seq": seq }))
        .collect();
    Reply::Ok(serde_json::json!({ "docs": docs, "bookmark": bookmark }).to_string())
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Doc {
    #[serde(rename = "_id")]
    pub id: String,
    pub seq: usize,
}
