//! # couchdb-client
//!
//! An async client for the CouchDB HTTP API built around two primitives:
//!
//! - **Cancellable execution**: every request runs on its own task and is raced
//!   against a [`CancelHandle`], a per-call timeout and an optional deadline.
//!   The race always resolves to exactly one [`Outcome`].
//! - **Bookmark-paginated cursors**: `_find` results are exposed as a lazy
//!   [`Cursor`] that decodes one document at a time from the buffered page and
//!   transparently fetches the next page with the last bookmark.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use couchdb_client::prelude::*;
//! use serde::Deserialize;
//!
//! #[derive(Debug, Deserialize)]
//! struct Task {
//!     #[serde(rename = "_id")]
//!     id: String,
//!     title: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), CouchError> {
//!     let config = ClientConfig::builder()
//!         .base_url("http://localhost:5984")
//!         .basic_auth("admin", "secret")
//!         .build()?;
//!     let connection = Connection::new(config)?;
//!     let db = connection.database("tasks");
//!
//!     let mut result = db
//!         .find(
//!             serde_json::json!({ "done": false }),
//!             None,
//!             FindOptions::new().limit(50),
//!         )
//!         .await?;
//!
//!     let cursor = result.cursor_mut();
//!     while cursor.advance().await {
//!         let task: Task = cursor.decode()?;
//!         println!("{} {}", task.id, task.title);
//!     }
//!     if let Some(err) = cursor.last_error() {
//!         eprintln!("pagination stopped early: {err}");
//!     }
//!     Ok(())
//! }
//! ```
#![deny(unsafe_code)]

pub mod connection;
pub mod database;
pub mod defaults;
pub mod error;
pub mod execution;
pub mod response;
pub mod streaming;
pub mod types;
pub mod utils;

pub use connection::Connection;
pub use database::Database;
pub use error::{CouchError, Result};
pub use execution::executor::{CancelReason, Outcome, execute};
pub use response::{MultiResult, SingleResult, Status};
pub use streaming::cursor::Cursor;
pub use types::{ClientConfig, FindOptions, QueryDescriptor, QueryMeta};
pub use utils::cancel::CancelHandle;

/// Commonly used types.
pub mod prelude {
    pub use crate::connection::Connection;
    pub use crate::database::Database;
    pub use crate::error::CouchError;
    pub use crate::execution::http::transport::Transport;
    pub use crate::response::{MultiResult, SingleResult, Status};
    pub use crate::streaming::cursor::Cursor;
    pub use crate::types::{AuthScheme, ClientConfig, FindOptions, QueryMeta};
    pub use crate::utils::cancel::CancelHandle;
}
