//! Client configuration types.
//!
//! `ClientConfig` describes where the server lives, how to authenticate and
//! how the HTTP layer behaves. Build it with `ClientConfig::builder()`, from
//! JSON via serde, or from the environment.

use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::defaults;
use crate::error::CouchError;

/// How requests are authenticated.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthScheme {
    /// No credentials are sent.
    #[default]
    None,
    /// RFC 7617 basic authentication.
    Basic {
        username: String,
        password: SecretString,
    },
    /// Externally issued JWT sent as a bearer token.
    Bearer { token: SecretString },
    /// Session cookie obtained from `_session`.
    Cookie { session: SecretString },
}

/// Client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server root, e.g. `http://localhost:5984`
    pub base_url: String,
    /// Authentication scheme
    pub auth: AuthScheme,
    /// Timeout enforced by the HTTP client for a whole exchange
    #[serde(with = "duration_option_serde")]
    pub timeout: Option<Duration>,
    /// Connection timeout
    #[serde(with = "duration_option_serde")]
    pub connect_timeout: Option<Duration>,
    /// Per-call timeout raced by the request executor
    #[serde(with = "duration_option_serde")]
    pub request_timeout: Option<Duration>,
    /// Headers added to every request
    pub headers: HashMap<String, String>,
    /// User agent
    pub user_agent: Option<String>,
    /// Proxy settings
    pub proxy: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::http::BASE_URL.to_string(),
            auth: AuthScheme::None,
            timeout: Some(defaults::http::REQUEST_TIMEOUT),
            connect_timeout: Some(defaults::http::CONNECT_TIMEOUT),
            request_timeout: None,
            headers: HashMap::new(),
            user_agent: Some(defaults::http::USER_AGENT.to_string()),
            proxy: None,
        }
    }
}

impl ClientConfig {
    /// Returns a builder for constructing `ClientConfig`
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Read the server URL and credentials from `COUCHDB_URL`, `COUCHDB_USER`,
    /// `COUCHDB_PASSWORD` and `COUCHDB_TOKEN`.
    ///
    /// A token takes precedence over a username/password pair.
    pub fn from_env() -> Result<Self, CouchError> {
        let mut builder = Self::builder();
        if let Ok(url) = std::env::var(defaults::env::URL) {
            builder = builder.base_url(url);
        }
        if let Ok(token) = std::env::var(defaults::env::TOKEN) {
            builder = builder.bearer_token(token);
        } else if let Ok(user) = std::env::var(defaults::env::USER) {
            let password = std::env::var(defaults::env::PASSWORD).unwrap_or_default();
            builder = builder.basic_auth(user, password);
        }
        builder.build()
    }

    /// Validate and normalise the configuration.
    pub fn validate(mut self) -> Result<Self, CouchError> {
        let trimmed = self.base_url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(CouchError::Configuration("base_url is empty".into()));
        }
        reqwest::Url::parse(trimmed)
            .map_err(|e| CouchError::Configuration(format!("invalid base_url '{trimmed}': {e}")))?;
        self.base_url = trimmed.to_string();
        Ok(self)
    }
}

/// Builder for `ClientConfig`
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    base_url: Option<String>,
    auth: AuthScheme,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    headers: HashMap<String, String>,
    user_agent: Option<String>,
    proxy: Option<String>,
}

impl ClientConfigBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
    pub fn basic_auth<U: Into<String>, P: Into<String>>(mut self, username: U, password: P) -> Self {
        self.auth = AuthScheme::Basic {
            username: username.into(),
            password: SecretString::from(password.into()),
        };
        self
    }
    pub fn bearer_token<S: Into<String>>(mut self, token: S) -> Self {
        self.auth = AuthScheme::Bearer {
            token: SecretString::from(token.into()),
        };
        self
    }
    pub fn session_cookie<S: Into<String>>(mut self, session: S) -> Self {
        self.auth = AuthScheme::Cookie {
            session: SecretString::from(session.into()),
        };
        self
    }
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = Some(connect_timeout);
        self
    }
    /// Per-call timeout enforced by the request executor, independent of any
    /// cancel handle the caller passes.
    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = Some(request_timeout);
        self
    }
    pub fn header<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }
    pub fn user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
    pub fn proxy<S: Into<String>>(mut self, proxy: S) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ClientConfig, CouchError> {
        let defaults = ClientConfig::default();
        ClientConfig {
            base_url: self.base_url.unwrap_or(defaults.base_url),
            auth: self.auth,
            timeout: self.timeout.or(defaults.timeout),
            connect_timeout: self.connect_timeout.or(defaults.connect_timeout),
            request_timeout: self.request_timeout,
            headers: self.headers,
            user_agent: self.user_agent.or(defaults.user_agent),
            proxy: self.proxy,
        }
        .validate()
    }
}

// Durations are expressed in whole seconds.
mod duration_option_serde {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs: Option<u64> = Option::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn builder_applies_defaults_and_trims_base_url() {
        let config = ClientConfig::builder()
            .base_url("http://db.local:5984/")
            .build()
            .expect("config");
        assert_eq!(config.base_url, "http://db.local:5984");
        assert_eq!(config.timeout, Some(defaults::http::REQUEST_TIMEOUT));
        assert_eq!(config.request_timeout, None);
        assert!(matches!(config.auth, AuthScheme::None));
    }

    #[test]
    fn builder_rejects_invalid_base_url() {
        let err = ClientConfig::builder().base_url("not a url").build().unwrap_err();
        assert!(matches!(err, CouchError::Configuration(_)));
    }

    #[test]
    fn deserializes_from_json_with_tagged_auth() {
        let config: ClientConfig = serde_json::from_value(serde_json::json!({
            "base_url": "https://couch.example.com",
            "auth": { "type": "basic", "username": "admin", "password": "pw" },
            "request_timeout": 5
        }))
        .expect("deserialize");

        assert_eq!(config.request_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.connect_timeout, Some(defaults::http::CONNECT_TIMEOUT));
        match config.auth {
            AuthScheme::Basic { username, password } => {
                assert_eq!(username, "admin");
                assert_eq!(password.expose_secret(), "pw");
            }
            other => panic!("unexpected auth: {other:?}"),
        }
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let config = ClientConfig::builder()
            .bearer_token("super-secret-token")
            .build()
            .expect("config");
        assert!(!format!("{config:?}").contains("super-secret-token"));
    }
}
