//! Server connection
//!
//! A `Connection` pairs a shared [`Transport`] with the configuration it was
//! built from. It is cheap to clone; every clone talks through the same
//! transport.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::database::Database;
use crate::defaults;
use crate::error::CouchError;
use crate::execution::executor::{collect_body, execute_until, expiry};
use crate::execution::http::client::ReqwestTransport;
use crate::execution::http::request::{HttpRequest, Method, RequestBuilder};
use crate::execution::http::transport::{ResponseBody, Transport};
use crate::response::{SingleResult, Status};
use crate::types::ClientConfig;
use crate::utils::cancel::CancelHandle;

#[derive(Clone)]
pub struct Connection {
    transport: Arc<dyn Transport>,
    config: Arc<ClientConfig>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("base_url", &self.config.base_url)
            .field("request_timeout", &self.config.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Connection {
    /// Validate `config` and connect through a `reqwest` transport.
    pub fn new(config: ClientConfig) -> Result<Self, CouchError> {
        let config = config.validate()?;
        let transport = ReqwestTransport::new(&config)?;
        debug!(base_url = %config.base_url, "connection configured");
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    /// Connect using `COUCHDB_URL` and the credential variables.
    pub fn from_env() -> Result<Self, CouchError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Use a caller-supplied transport. Only `request_timeout` is read from
    /// `config`; the transport owns addressing and authentication.
    pub fn with_transport(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self {
            transport,
            config: Arc::new(config),
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Handle on the database `name`. No request is made.
    pub fn database<S: Into<String>>(&self, name: S) -> Database {
        Database::new(name, self.clone())
    }

    /// Check that the server answers `GET /_up`.
    pub async fn up(&self) -> Result<Status, CouchError> {
        let result = self.get(defaults::endpoints::UP).await?;
        Ok(result.status().clone())
    }

    /// Information about the current session (`GET /_session`).
    pub async fn session(&self) -> Result<SingleResult, CouchError> {
        self.get(defaults::endpoints::SESSION).await
    }

    /// Ask the server for `count` UUIDs (`GET /_uuids?count=`).
    pub async fn uuids(&self, count: u32) -> Result<SingleResult, CouchError> {
        if count > defaults::MAX_UUIDS {
            return Err(CouchError::InvalidInput(format!(
                "uuid count {count} exceeds {}",
                defaults::MAX_UUIDS
            )));
        }
        let request = RequestBuilder::new()
            .method(Method::Get)
            .endpoint(defaults::endpoints::UUIDS)
            .param("count", count.to_string())
            .build()?;
        self.request(request, &CancelHandle::new()).await
    }

    /// Names of every database (`GET /_all_dbs`).
    pub async fn all_dbs(&self) -> Result<SingleResult, CouchError> {
        self.get(defaults::endpoints::ALL_DBS).await
    }

    /// Information about the database `name` (`POST /_dbs_info`).
    pub async fn dbs_info(&self, name: &str) -> Result<SingleResult, CouchError> {
        if name.is_empty() {
            return Err(CouchError::InvalidInput("database name is empty".into()));
        }
        let request = RequestBuilder::new()
            .method(Method::Post)
            .endpoint(defaults::endpoints::DBS_INFO)
            .json(&serde_json::json!({ "keys": [name] }))
            .build()?;
        self.request(request, &CancelHandle::new()).await
    }

    async fn get(&self, endpoint: &str) -> Result<SingleResult, CouchError> {
        let request = RequestBuilder::new()
            .method(Method::Get)
            .endpoint(endpoint)
            .build()?;
        self.request(request, &CancelHandle::new()).await
    }

    /// Execute a prepared request.
    ///
    /// The body is read under the same cancel handle, deadline and
    /// `request_timeout` as the headers. Status >= 400 is turned into
    /// `CouchError::Api`.
    pub async fn request(
        &self,
        request: HttpRequest,
        cancel: &CancelHandle,
    ) -> Result<SingleResult, CouchError> {
        let expires = expiry(cancel, self.config.request_timeout);
        let response = execute_until(&self.transport, request, cancel, expires)
            .await
            .into_result()?;
        let status = response.status();
        let body = collect_body(response.body, cancel, expires).await?;
        if status.is_error() {
            return Err(CouchError::from_response(status, &body));
        }
        Ok(SingleResult::new(
            status,
            ResponseBody::from_bytes(body),
            response.session,
        ))
    }
}
