//! Request execution
//!
//! - `http`: the transport capability, request construction and the default
//!   `reqwest` transport
//! - `executor`: the cancellable race that turns one exchange into an `Outcome`

pub mod executor;
pub mod http;
