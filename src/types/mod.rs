//! Shared data types: client configuration and query descriptors.

pub mod config;
pub mod query;

pub use config::{AuthScheme, ClientConfig, ClientConfigBuilder};
pub use query::{FindOptions, QueryDescriptor, QueryMeta};
