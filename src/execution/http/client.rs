//! Default transport backed by `reqwest`.
//!
//! The client is built once from `ClientConfig` and shared by every request
//! made through a `Connection`; there is no process-wide default client.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{
    ACCEPT, AUTHORIZATION, CONTENT_TYPE, COOKIE, HeaderMap, HeaderName, HeaderValue, SERVER,
    SET_COOKIE,
};
use secrecy::ExposeSecret;

use crate::defaults;
use crate::error::CouchError;
use crate::execution::http::request::HttpRequest;
use crate::execution::http::transport::{
    ResponseBody, Transport, TransportError, TransportResponse,
};
use crate::types::{AuthScheme, ClientConfig};

/// Build the `reqwest::Client` a `ReqwestTransport` shares across requests.
///
/// Every request speaks JSON, so `Accept` and `Content-Type` default to
/// `application/json`. Extra headers from the config are layered on top but
/// may not carry credentials when `auth` already does.
pub fn build_client(config: &ClientConfig) -> Result<reqwest::Client, CouchError> {
    let mut builder = reqwest::Client::builder()
        .default_headers(default_headers(config)?)
        .user_agent(
            config
                .user_agent
                .as_deref()
                .unwrap_or(defaults::http::USER_AGENT),
        );

    if let Some(timeout) = config.timeout {
        builder = builder.timeout(timeout);
    }
    if let Some(connect_timeout) = config.connect_timeout {
        builder = builder.connect_timeout(connect_timeout);
    }
    if let Some(proxy) = &config.proxy {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| CouchError::Configuration(format!("invalid proxy '{proxy}': {e}")))?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| CouchError::Configuration(format!("cannot build HTTP client: {e}")))
}

fn default_headers(config: &ClientConfig) -> Result<HeaderMap, CouchError> {
    let json = HeaderValue::from_static("application/json");
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, json.clone());
    headers.insert(CONTENT_TYPE, json);

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| CouchError::Configuration(format!("invalid header name '{name}': {e}")))?;
        if !matches!(config.auth, AuthScheme::None) && (name == AUTHORIZATION || name == COOKIE) {
            return Err(CouchError::Configuration(format!(
                "header '{name}' conflicts with the configured auth"
            )));
        }
        let value = HeaderValue::from_str(value)
            .map_err(|e| CouchError::Configuration(format!("invalid value for '{name}': {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

/// `Transport` implementation over a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: reqwest::Url,
    auth: AuthScheme,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, CouchError> {
        let client = build_client(config)?;
        Self::with_client(client, config)
    }

    /// Reuse an existing client; only `base_url` and `auth` are read from the config.
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Result<Self, CouchError> {
        // a trailing slash makes `join` append endpoints instead of replacing
        // the last path segment
        let root = format!("{}/", config.base_url.trim_end_matches('/'));
        let base_url = reqwest::Url::parse(&root).map_err(|e| {
            CouchError::Configuration(format!("invalid base_url '{}': {e}", config.base_url))
        })?;
        Ok(Self {
            client,
            base_url,
            auth: config.auth.clone(),
        })
    }

    fn url_for(&self, request: &HttpRequest) -> Result<reqwest::Url, TransportError> {
        let mut url = self
            .base_url
            .join(&request.endpoint)
            .map_err(|e| TransportError::new(format!("invalid endpoint '{}': {e}", request.endpoint)))?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }
}

fn session_from_headers(headers: &reqwest::header::HeaderMap) -> Option<String> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|cookie| cookie.split(';').next())
        .filter_map(|pair| pair.split_once('='))
        .find(|(name, _)| name.trim() == defaults::SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<TransportResponse, TransportError> {
        let url = self.url_for(&request)?;
        let mut rb = self.client.request(request.method.to_reqwest(), url);

        rb = match &self.auth {
            AuthScheme::None => rb,
            AuthScheme::Basic { username, password } => {
                rb.basic_auth(username, Some(password.expose_secret()))
            }
            AuthScheme::Bearer { token } => rb.bearer_auth(token.expose_secret()),
            AuthScheme::Cookie { session } => rb.header(
                COOKIE,
                format!("{}={}", defaults::SESSION_COOKIE, session.expose_secret()),
            ),
        };

        let resp = rb
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| TransportError::new(e.to_string()))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let server = headers
            .get(SERVER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let session = session_from_headers(&headers);
        let body = ResponseBody::from_stream(
            resp.bytes_stream()
                .map(|chunk| chunk.map_err(|e| TransportError::new(e.to_string()))),
        );

        Ok(TransportResponse {
            status: status.as_u16(),
            status_text: status.to_string(),
            server,
            headers,
            session,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn json_headers_are_defaults_and_extras_are_kept() {
        let mut config = ClientConfig {
            timeout: Some(Duration::from_secs(30)),
            ..Default::default()
        };
        config
            .headers
            .insert("X-Couch-Full-Commit".to_string(), "false".to_string());
        let headers = default_headers(&config).unwrap();
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
        assert_eq!(headers["x-couch-full-commit"], "false");
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn invalid_header_is_a_configuration_error() {
        let mut config = ClientConfig::default();
        config
            .headers
            .insert("bad header".to_string(), "x".to_string());
        assert!(matches!(
            build_client(&config),
            Err(CouchError::Configuration(_))
        ));
    }

    #[test]
    fn credential_headers_conflict_with_auth() {
        let mut config = ClientConfig::builder()
            .basic_auth("admin", "secret")
            .build()
            .unwrap();
        config
            .headers
            .insert("Cookie".to_string(), "AuthSession=stale".to_string());
        let err = build_client(&config).unwrap_err();
        assert!(matches!(&err, CouchError::Configuration(m) if m.contains("cookie")));

        config.auth = AuthScheme::None;
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn urls_keep_base_path_and_query() {
        let config = ClientConfig {
            base_url: "http://localhost:5984/couch".into(),
            ..Default::default()
        };
        let transport = ReqwestTransport::new(&config).expect("transport");
        let request = crate::execution::http::request::RequestBuilder::new()
            .method(crate::execution::http::request::Method::Get)
            .endpoint("tasks/doc%2F1")
            .param("revs", "true")
            .build()
            .expect("request");
        let url = transport.url_for(&request).expect("url");
        assert_eq!(url.as_str(), "http://localhost:5984/couch/tasks/doc%2F1?revs=true");
    }

    #[test]
    fn session_cookie_is_extracted() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("other=1; Path=/"));
        headers.append(
            SET_COOKIE,
            HeaderValue::from_static("AuthSession=YWRtaW46NjM; Version=1; Path=/; HttpOnly"),
        );
        assert_eq!(session_from_headers(&headers).as_deref(), Some("YWRtaW46NjM"));
    }
}
