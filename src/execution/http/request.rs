//! Request construction.
//!
//! `RequestBuilder` validates everything that can be checked without the
//! network: an unknown method, an empty endpoint, bad header names or a body
//! that fails to serialize are rejected by `build` before any exchange starts.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

use crate::error::CouchError;

/// HTTP methods accepted by the server API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Head,
    Get,
    Put,
    Post,
    Delete,
    /// Non-standard method used by the document copy endpoint.
    Copy,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Head => "HEAD",
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Copy => "COPY",
        }
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Head => reqwest::Method::HEAD,
            Self::Get => reqwest::Method::GET,
            Self::Put => reqwest::Method::PUT,
            Self::Post => reqwest::Method::POST,
            Self::Delete => reqwest::Method::DELETE,
            // extension methods are plain tokens; this one is always valid
            Self::Copy => reqwest::Method::from_bytes(b"COPY").unwrap_or(reqwest::Method::POST),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = CouchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HEAD" => Ok(Self::Head),
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            "POST" => Ok(Self::Post),
            "DELETE" => Ok(Self::Delete),
            "COPY" => Ok(Self::Copy),
            other => Err(CouchError::InvalidRequest(format!(
                "invalid http method '{other}'"
            ))),
        }
    }
}

/// A fully-formed request, relative to the transport's base URL.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Path relative to the server root, without a leading slash.
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Builder for `HttpRequest`.
#[derive(Debug, Default)]
pub struct RequestBuilder {
    method: Option<String>,
    endpoint: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Bytes,
    body_error: Option<String>,
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method.as_str().to_string());
        self
    }

    /// Set the method by name; unknown names fail in `build`.
    pub fn method_name<S: Into<String>>(mut self, method: S) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn body<B: Into<Bytes>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.body = Bytes::from(bytes),
            Err(e) => self.body_error = Some(e.to_string()),
        }
        self
    }

    pub fn build(self) -> Result<HttpRequest, CouchError> {
        let method = self
            .method
            .as_deref()
            .ok_or_else(|| CouchError::InvalidRequest("http method not set".into()))?
            .parse::<Method>()?;

        if let Some(e) = self.body_error {
            return Err(CouchError::InvalidRequest(format!(
                "failed to serialize body: {e}"
            )));
        }

        let endpoint = self.endpoint.trim_start_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(CouchError::InvalidRequest("endpoint not set".into()));
        }

        let mut headers = HeaderMap::new();
        for (k, v) in &self.headers {
            let name = HeaderName::from_bytes(k.as_bytes()).map_err(|e| {
                CouchError::InvalidRequest(format!("invalid header name '{k}': {e}"))
            })?;
            let value = HeaderValue::from_str(v).map_err(|e| {
                CouchError::InvalidRequest(format!("invalid header value for '{k}': {e}"))
            })?;
            headers.append(name, value);
        }

        Ok(HttpRequest {
            method,
            endpoint,
            query: self.query,
            headers,
            body: self.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_post_with_json_body() {
        let request = RequestBuilder::new()
            .method(Method::Post)
            .endpoint("/tasks/_find")
            .json(&serde_json::json!({ "selector": {} }))
            .build()
            .expect("request");
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.endpoint, "tasks/_find");
        assert_eq!(&request.body[..], br#"{"selector":{}}"#);
    }

    #[test]
    fn unknown_method_is_rejected_before_sending() {
        let err = RequestBuilder::new()
            .method_name("PATCH")
            .endpoint("tasks")
            .build()
            .unwrap_err();
        assert!(matches!(err, CouchError::InvalidRequest(msg) if msg.contains("PATCH")));
    }

    #[test]
    fn missing_method_and_endpoint_are_rejected() {
        assert!(RequestBuilder::new().endpoint("x").build().is_err());
        assert!(RequestBuilder::new().method(Method::Get).build().is_err());
    }

    #[test]
    fn copy_keeps_its_extension_name() {
        assert_eq!(Method::Copy.to_reqwest().as_str(), "COPY");
        assert_eq!("COPY".parse::<Method>().unwrap(), Method::Copy);
    }

    #[test]
    fn headers_and_params_are_kept_in_order() {
        let request = RequestBuilder::new()
            .method(Method::Copy)
            .endpoint("tasks/a")
            .header("Destination", "b")
            .param("rev", "1-abc")
            .param("batch", "ok")
            .build()
            .expect("request");
        assert_eq!(request.headers.get("destination").unwrap(), "b");
        assert_eq!(
            request.query,
            vec![("rev".into(), "1-abc".into()), ("batch".into(), "ok".into())]
        );
    }
}
