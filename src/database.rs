//! Database handle
//!
//! Document reads and Mango queries scoped to one database.

use tracing::debug;

use crate::connection::Connection;
use crate::defaults;
use crate::error::CouchError;
use crate::execution::http::request::{Method, RequestBuilder};
use crate::response::{MultiResult, SingleResult};
use crate::streaming::cursor::Cursor;
use crate::streaming::page::PageFetcher;
use crate::types::{FindOptions, QueryDescriptor};
use crate::utils::cancel::CancelHandle;

#[derive(Debug, Clone)]
pub struct Database {
    name: String,
    connection: Connection,
}

impl Database {
    pub fn new<S: Into<String>>(name: S, connection: Connection) -> Self {
        Self {
            name: name.into(),
            connection,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    fn path(&self, suffix: Option<&str>) -> Result<String, CouchError> {
        if self.name.is_empty() {
            return Err(CouchError::InvalidInput("database name is empty".into()));
        }
        let db = urlencoding::encode(&self.name);
        Ok(match suffix {
            Some(suffix) => format!("{db}/{suffix}"),
            None => db.into_owned(),
        })
    }

    /// Run a Mango query and return a cursor over its results.
    ///
    /// The first page is requested before this returns; later pages are
    /// requested as the cursor advances.
    pub async fn find(
        &self,
        selector: serde_json::Value,
        fields: Option<Vec<String>>,
        options: FindOptions,
    ) -> Result<MultiResult, CouchError> {
        self.find_with_cancel(selector, fields, options, CancelHandle::new())
            .await
    }

    /// Like [`Database::find`]. `cancel` stays attached to the cursor and
    /// governs every page fetch, including its deadline.
    pub async fn find_with_cancel(
        &self,
        selector: serde_json::Value,
        fields: Option<Vec<String>>,
        options: FindOptions,
        cancel: CancelHandle,
    ) -> Result<MultiResult, CouchError> {
        if selector.is_null() {
            return Err(CouchError::InvalidInput("selector is required".into()));
        }
        let endpoint = self.path(Some(defaults::endpoints::FIND))?;
        let descriptor = QueryDescriptor::new(selector)
            .with_fields(fields)
            .with_options(&options);

        let fetcher = PageFetcher::new(
            self.connection.transport().clone(),
            endpoint,
            self.connection.config().request_timeout,
        );
        let (status, first) = fetcher.fetch_page(&descriptor, &cancel).await?;
        let session = first.session.clone();
        debug!(db = %self.name, bookmark = %first.bookmark, "query opened");

        let cursor = Cursor::new(first, descriptor, fetcher, cancel)?;
        Ok(MultiResult::new(status, cursor, session))
    }

    /// Fetch the document `id`.
    pub async fn get(&self, id: &str) -> Result<SingleResult, CouchError> {
        self.get_with_cancel(id, &CancelHandle::new()).await
    }

    pub async fn get_with_cancel(
        &self,
        id: &str,
        cancel: &CancelHandle,
    ) -> Result<SingleResult, CouchError> {
        if id.is_empty() {
            return Err(CouchError::InvalidInput("document id is empty".into()));
        }
        let request = RequestBuilder::new()
            .method(Method::Get)
            .endpoint(self.path(Some(urlencoding::encode(id).as_ref()))?)
            .build()?;
        self.connection.request(request, cancel).await
    }

    /// Database information (`GET /{db}`).
    pub async fn stat(&self) -> Result<SingleResult, CouchError> {
        let request = RequestBuilder::new()
            .method(Method::Get)
            .endpoint(self.path(None)?)
            .build()?;
        self.connection.request(request, &CancelHandle::new()).await
    }
}
