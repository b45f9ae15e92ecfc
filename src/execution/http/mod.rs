//! HTTP plumbing shared by every request.

pub mod client;
pub mod request;
pub mod transport;

pub use client::{ReqwestTransport, build_client};
pub use request::{HttpRequest, Method, RequestBuilder};
pub use transport::{ResponseBody, Transport, TransportError, TransportResponse};
