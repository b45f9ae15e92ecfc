//! Default Configuration Values
//!
//! Centralizes the default values used by the client.

use std::time::Duration;

/// HTTP client default configurations
pub mod http {
    use super::*;

    /// Default timeout applied by the underlying `reqwest::Client`.
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

    /// Default connection timeout for establishing HTTP connections.
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Default User-Agent string for HTTP requests
    pub const USER_AGENT: &str = concat!("couchdb-client/", env!("CARGO_PKG_VERSION"));

    /// Default base URL of a local CouchDB node.
    pub const BASE_URL: &str = "http://127.0.0.1:5984";
}

/// Endpoint names of the server API.
pub mod endpoints {
    /// Mango query endpoint, relative to a database.
    pub const FIND: &str = "_find";
    /// Liveness endpoint, relative to the server root.
    pub const UP: &str = "_up";
    /// Session of the current credentials.
    pub const SESSION: &str = "_session";
    /// Server-generated UUIDs.
    pub const UUIDS: &str = "_uuids";
    /// Names of every database.
    pub const ALL_DBS: &str = "_all_dbs";
    /// Information about selected databases.
    pub const DBS_INFO: &str = "_dbs_info";
}

/// Upper bound the server accepts for `_uuids?count=`.
pub const MAX_UUIDS: u32 = 1000;

/// Name of the cookie carrying a CouchDB session token.
pub const SESSION_COOKIE: &str = "AuthSession";

/// Environment variables read by `ClientConfig::from_env`.
pub mod env {
    pub const URL: &str = "COUCHDB_URL";
    pub const USER: &str = "COUCHDB_USER";
    pub const PASSWORD: &str = "COUCHDB_PASSWORD";
    pub const TOKEN: &str = "COUCHDB_TOKEN";
}
