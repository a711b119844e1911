//! HTTP transport boundary
//!
//! A narrow GET-JSON trait the resolver and fetcher talk through, a reqwest
//! implementation, and the bounded retry loop that wraps every call. Failures
//! carry an explicit retryable/fatal classification so the retry loop is a
//! plain state machine rather than exception unwinding.

mod http;
mod retry;

pub use http::HttpTransport;
pub use retry::{with_retry, RetryPolicy};

use async_trait::async_trait;
use thiserror::Error;

/// Transport-level failure with retryability baked into the variant
#[derive(Debug, Error)]
pub enum TransportError {
    /// Request exceeded the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),
    /// Connection-level failure (DNS, refused, reset)
    #[error("connection failed: {0}")]
    Connection(String),
    /// Non-success HTTP status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    /// Response body was not the expected JSON
    #[error("non-JSON response: {0}")]
    Decode(String),
}

impl TransportError {
    /// Whether the retry loop should attempt this call again.
    ///
    /// Timeouts, connection failures, 429 and 5xx are transient; other 4xx
    /// and undecodable bodies are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

/// GET-JSON capability against a configured base URL.
///
/// The single seam between the pipeline and the network; tests inject fakes
/// with scripted page sequences.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET to `path` (joined to the base URL) and decode JSON
    async fn get_json(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<serde_json::Value, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_and_connection_failures_are_retryable() {
        assert!(TransportError::Timeout("deadline".into()).is_retryable());
        assert!(TransportError::Connection("refused".into()).is_retryable());
    }

    #[test]
    fn rate_limits_and_server_errors_are_retryable() {
        for status in [429, 500, 502, 503] {
            let err = TransportError::Status {
                status,
                body: String::new(),
            };
            assert!(err.is_retryable(), "status {status} should be retryable");
        }
    }

    #[test]
    fn client_errors_and_bad_payloads_are_fatal() {
        for status in [400, 403, 404] {
            let err = TransportError::Status {
                status,
                body: String::new(),
            };
            assert!(!err.is_retryable(), "status {status} should be fatal");
        }
        assert!(!TransportError::Decode("not json".into()).is_retryable());
    }
}
