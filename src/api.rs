//! Structured-result extraction
//!
//! A raw transport success with an error status is not a transport failure;
//! it becomes one of the typed failures in [`crate::error`] only after the
//! response has been inspected. [`ApiSnapshot`] is that inspection: a
//! deterministic function of the response bytes producing the status, the
//! rate-limit counters and the optional application error payload. The retry
//! policies classify what this module raises.

use std::time::Duration;

use chrono::{DateTime, Utc};
use http::{HeaderMap, StatusCode};
use serde::Deserialize;

use crate::error::Error;
use crate::http::Response;

/// Rate-limit counters reported by the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitSnapshot {
    /// Requests allowed per window, if reported.
    pub limit: Option<u32>,
    /// Requests remaining in the current window, if reported.
    pub remaining: Option<u32>,
    /// Instant the window resets (from epoch seconds), if reported.
    pub reset_at: Option<DateTime<Utc>>,
}

impl RateLimitSnapshot {
    /// Extract the counters from `x-ratelimit-*` headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            limit: parse_header_u32(headers, "x-ratelimit-limit"),
            remaining: parse_header_u32(headers, "x-ratelimit-remaining"),
            reset_at: parse_header_u64(headers, "x-ratelimit-reset")
                .and_then(|secs| DateTime::from_timestamp(secs as i64, 0)),
        }
    }
}

/// Application-level error payload, as encoded by GitHub-style APIs.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorPayload {
    /// Human-readable error message.
    pub message: String,
    /// Link to the relevant documentation, when provided.
    #[serde(default)]
    pub documentation_url: Option<String>,
}

/// Structured view of one raw response.
#[derive(Debug, Clone)]
pub struct ApiSnapshot {
    /// HTTP status of the exchange.
    pub status: StatusCode,
    /// Rate-limit counters from the exchange's headers.
    pub rate_limit: RateLimitSnapshot,
    /// Server-suggested retry interval, when present.
    pub retry_after: Option<Duration>,
    /// Decoded application error, for non-2xx responses with a readable
    /// payload.
    pub error: Option<ApiErrorPayload>,
}

impl ApiSnapshot {
    /// Extract a snapshot from a buffered response.
    ///
    /// Extraction is deterministic given the same response bytes; an
    /// unreadable error payload degrades to a message-free snapshot rather
    /// than failing.
    pub fn from_response(response: &Response) -> Self {
        let headers = response.headers();
        let error = if response.is_error() {
            serde_json::from_slice(response.body()).ok()
        } else {
            None
        };

        Self {
            status: response.status(),
            rate_limit: RateLimitSnapshot::from_headers(headers),
            retry_after: parse_header_u64(headers, "retry-after").map(Duration::from_secs),
            error,
        }
    }

    /// Map the snapshot onto the failure taxonomy.
    ///
    /// Returns `None` for anything that is not an application-level error
    /// (2xx, redirects, 304 Not Modified). Throttling statuses (403/429) are
    /// split into primary rate-limit exhaustion (remaining counter at zero)
    /// and the secondary abuse signal (retry-after hint or an abuse-flavored
    /// message); everything else non-2xx becomes [`Error::Api`].
    pub fn into_error(self) -> Option<Error> {
        if !(self.status.is_client_error() || self.status.is_server_error()) {
            return None;
        }

        let message = self
            .error
            .as_ref()
            .map(|e| e.message.clone())
            .unwrap_or_else(|| {
                format!(
                    "HTTP {} {}",
                    self.status.as_u16(),
                    self.status.canonical_reason().unwrap_or("error")
                )
            });

        if self.status == StatusCode::FORBIDDEN || self.status == StatusCode::TOO_MANY_REQUESTS {
            if self.rate_limit.remaining == Some(0) {
                return Some(Error::RateLimit {
                    remaining: self.rate_limit.remaining,
                    reset_at: self.rate_limit.reset_at,
                    message,
                });
            }
            let abuse_flavored = message.to_lowercase().contains("abuse")
                || message.to_lowercase().contains("secondary rate limit");
            if self.retry_after.is_some() || abuse_flavored {
                return Some(Error::Abuse {
                    retry_after: self.retry_after,
                    message,
                });
            }
        }

        Some(Error::Api {
            status: self.status.as_u16(),
            message,
        })
    }
}

fn parse_header_u32(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

fn parse_header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
