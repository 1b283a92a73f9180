//! Error types for octofort
//!
//! One failure family per variant, following Rust idioms with the `thiserror`
//! crate. Retry policies classify failures by variant, so the taxonomy here is
//! the contract between the transport layer, the structured-result extraction
//! and the resiliency layer.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type alias for operations that can fail with an octofort error.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for octofort.
#[derive(Debug, Error)]
pub enum Error {
    /// The transport could not complete the exchange (DNS, TCP, TLS, broken
    /// connection). Always retryable at the connection policy's discretion.
    #[error("connection error: {0}")]
    Connection(String),

    /// A single attempt exceeded the transport's own deadline.
    ///
    /// Distinct from [`Error::Cancelled`]: a timeout belongs to the attempt,
    /// a cancellation belongs to the caller.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The caller gave up on the logical call. Never retried.
    #[error("request cancelled by caller")]
    Cancelled,

    /// The primary rate limit is exhausted.
    #[error("rate limit exceeded: {message}")]
    RateLimit {
        /// Requests remaining in the current window, if reported.
        remaining: Option<u32>,
        /// Instant at which the window resets, if reported.
        reset_at: Option<DateTime<Utc>>,
        /// Error message from the remote service.
        message: String,
    },

    /// The secondary rate limit (abuse detection) tripped.
    #[error("abuse detection triggered: {message}")]
    Abuse {
        /// Server-suggested wait before the next attempt, if reported.
        retry_after: Option<Duration>,
        /// Error message from the remote service.
        message: String,
    },

    /// Generic application-level error: the transport succeeded but the
    /// response carries a non-2xx status not covered by a more specific
    /// variant.
    #[error("upstream error (status {status}): {message}")]
    Api {
        /// HTTP status code of the response.
        status: u16,
        /// Error message extracted from the response payload.
        message: String,
    },

    /// Programmer misuse, such as an empty URI or an empty policy list.
    /// Never retried; surfaces immediately.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A cache store backend declined an operation it cannot support.
    #[error("unsupported operation: {0}")]
    Unsupported(String),

    /// Failed to decode a structured payload.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Short classification label used in structured log events.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Connection(_) => "connection",
            Error::Timeout(_) => "timeout",
            Error::Cancelled => "cancelled",
            Error::RateLimit { .. } => "rate_limit",
            Error::Abuse { .. } => "abuse",
            Error::Api { .. } => "api",
            Error::InvalidArgument(_) => "invalid_argument",
            Error::Unsupported(_) => "unsupported",
            Error::Serialization(_) => "serialization",
        }
    }

    /// Rate-limit reset instant, when this is a [`Error::RateLimit`].
    pub fn rate_limit_reset(&self) -> Option<DateTime<Utc>> {
        match self {
            Error::RateLimit { reset_at, .. } => *reset_at,
            _ => None,
        }
    }

    /// Server-suggested retry-after interval, when this is an
    /// [`Error::Abuse`].
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Error::Abuse { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_labels() {
        assert_eq!(Error::Connection("boom".into()).kind(), "connection");
        assert_eq!(Error::Timeout(Duration::from_secs(10)).kind(), "timeout");
        assert_eq!(Error::Cancelled.kind(), "cancelled");
        assert_eq!(
            Error::Api {
                status: 502,
                message: "bad gateway".into()
            }
            .kind(),
            "api"
        );
    }

    #[test]
    fn test_retry_after_only_on_abuse() {
        let abuse = Error::Abuse {
            retry_after: Some(Duration::from_secs(12)),
            message: "slow down".into(),
        };
        assert_eq!(abuse.retry_after(), Some(Duration::from_secs(12)));

        let limit = Error::RateLimit {
            remaining: Some(0),
            reset_at: None,
            message: "exhausted".into(),
        };
        assert_eq!(limit.retry_after(), None);
    }

    #[test]
    fn test_rate_limit_reset_accessor() {
        let reset = Utc::now();
        let err = Error::RateLimit {
            remaining: Some(0),
            reset_at: Some(reset),
            message: "exhausted".into(),
        };
        assert_eq!(err.rate_limit_reset(), Some(reset));
        assert_eq!(Error::Cancelled.rate_limit_reset(), None);
    }
}
