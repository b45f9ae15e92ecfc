//! Error Handling Module
//!
//! - Core error type (`CouchError`, `ErrorCategory`)
//! - Type conversions from common error types
//!
//! # Example
//!
//! ```rust,ignore
//! use couchdb_client::error::{CouchError, ErrorCategory};
//!
//! let error = CouchError::Transport("connection refused".into());
//! assert_eq!(error.category(), ErrorCategory::Transport);
//! ```

mod conversions;
pub mod types;

pub use types::*;
