//! Type Conversions for CouchError

use super::types::CouchError;
use crate::execution::http::transport::TransportError;

impl From<reqwest::Error> for CouchError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for CouchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<TransportError> for CouchError {
    fn from(err: TransportError) -> Self {
        Self::Transport(err.message().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: CouchError = json_err.into();
        assert!(matches!(err, CouchError::Decode(_)));
    }

    #[test]
    fn test_from_transport_error_keeps_message() {
        let err: CouchError = TransportError::new("dns error: no such host").into();
        match err {
            CouchError::Transport(msg) => assert_eq!(msg, "dns error: no such host"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
