//! Cache entry
//!
//! An entry is an immutable snapshot of one prior response. A fresh response
//! for the same key never mutates an entry; it produces a replacement.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::header::{ETAG, EXPIRES, LAST_MODIFIED};
use http::{HeaderMap, HeaderValue, StatusCode};

use crate::http::Response;

/// HTTP date layout used when echoing a stored timestamp back to the server.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Immutable snapshot of a cached response.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    status: StatusCode,
    etag: Option<HeaderValue>,
    last_modified: Option<DateTime<Utc>>,
    body: Option<Bytes>,
    content_headers: HeaderMap,
}

impl CacheEntry {
    /// Capture a response into an entry.
    ///
    /// The response body is already fully buffered by the transport (the
    /// wire stream is drained exactly once), so capture is a matter of
    /// sharing the buffer and lifting the validators out of the headers.
    pub fn capture(response: &Response) -> Self {
        let headers = response.headers();
        let etag = headers.get(ETAG).cloned();
        let last_modified = headers
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| DateTime::parse_from_rfc2822(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        let body = if response.body().is_empty() {
            None
        } else {
            Some(response.body().clone())
        };

        let mut content_headers = HeaderMap::new();
        for (name, value) in headers {
            if name.as_str().starts_with("content-") || name == LAST_MODIFIED || name == EXPIRES {
                content_headers.append(name.clone(), value.clone());
            }
        }

        Self {
            status: response.status(),
            etag,
            last_modified,
            body,
            content_headers,
        }
    }

    /// Whether the server can revalidate this entry.
    ///
    /// True when an entity tag is present, or when both a body and a
    /// last-modified timestamp are. An entry without a validator can still be
    /// served, but every request for it is effectively a fresh fetch.
    pub fn has_validator(&self) -> bool {
        self.etag.is_some() || (self.body.is_some() && self.last_modified.is_some())
    }

    /// The entity tag, if the cached response carried one.
    pub fn etag(&self) -> Option<&HeaderValue> {
        self.etag.as_ref()
    }

    /// The last-modified timestamp, if the cached response carried one.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    /// The last-modified timestamp rendered as an HTTP date, suitable for an
    /// `If-Modified-Since` precondition.
    pub fn last_modified_http_date(&self) -> Option<HeaderValue> {
        self.last_modified.and_then(|dt| {
            HeaderValue::try_from(dt.format(HTTP_DATE_FORMAT).to_string()).ok()
        })
    }

    /// The cached status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The buffered body, if any.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Reconstruct a response from this entry.
    ///
    /// `live_headers` are the transport-level headers of the exchange that
    /// produced the "not modified" answer; they go on first so freshness
    /// metadata (rate-limit counters and the like) reflects the live
    /// exchange. The entry's own content headers are then overlaid, and the
    /// body is an independent handle over the stored buffer, so consuming
    /// the materialized response never disturbs the entry.
    pub fn materialize(&self, live_headers: &HeaderMap) -> Response {
        let mut headers = live_headers.clone();
        for (name, value) in &self.content_headers {
            headers.insert(name.clone(), value.clone());
        }
        let body = self.body.clone().unwrap_or_default();
        Response::new(self.status, headers, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::CONTENT_TYPE;

    fn cached_response() -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(ETAG, HeaderValue::from_static("\"abc\""));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            LAST_MODIFIED,
            HeaderValue::from_static("Tue, 15 Nov 1994 08:12:31 GMT"),
        );
        Response::new(StatusCode::OK, headers, br#"{"id":1}"#.to_vec())
    }

    #[test]
    fn test_capture_lifts_validators() {
        let entry = CacheEntry::capture(&cached_response());
        assert!(entry.has_validator());
        assert_eq!(entry.etag().unwrap(), "\"abc\"");
        assert!(entry.last_modified().is_some());
        assert_eq!(
            entry.last_modified_http_date().unwrap(),
            "Tue, 15 Nov 1994 08:12:31 GMT"
        );
    }

    #[test]
    fn test_no_validator_without_etag_or_timestamp() {
        let resp = Response::new(StatusCode::OK, HeaderMap::new(), b"body".to_vec());
        let entry = CacheEntry::capture(&resp);
        assert!(!entry.has_validator());
    }

    #[test]
    fn test_body_alone_is_not_a_validator() {
        let mut headers = HeaderMap::new();
        headers.insert(
            LAST_MODIFIED,
            HeaderValue::from_static("Tue, 15 Nov 1994 08:12:31 GMT"),
        );
        let with_timestamp = Response::new(StatusCode::OK, headers, b"body".to_vec());
        assert!(CacheEntry::capture(&with_timestamp).has_validator());

        let empty_body = Response::new(StatusCode::OK, HeaderMap::new(), Vec::new());
        assert!(!CacheEntry::capture(&empty_body).has_validator());
    }

    #[test]
    fn test_materialize_round_trip() {
        let original = cached_response();
        let entry = CacheEntry::capture(&original);
        let rebuilt = entry.materialize(&HeaderMap::new());

        assert_eq!(rebuilt.status(), original.status());
        assert_eq!(rebuilt.body(), original.body());
        assert_eq!(
            rebuilt.headers().get(CONTENT_TYPE),
            original.headers().get(CONTENT_TYPE)
        );
    }

    #[test]
    fn test_materialize_layers_live_headers() {
        let entry = CacheEntry::capture(&cached_response());

        let mut live = HeaderMap::new();
        live.insert("x-ratelimit-remaining", HeaderValue::from_static("41"));
        // A live content header must lose to the entry's stored one.
        live.insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let rebuilt = entry.materialize(&live);
        assert_eq!(rebuilt.headers().get("x-ratelimit-remaining").unwrap(), "41");
        assert_eq!(rebuilt.headers().get(CONTENT_TYPE).unwrap(), "application/json");
    }

    #[test]
    fn test_materialized_response_is_independent() {
        let entry = CacheEntry::capture(&cached_response());
        let first = entry.materialize(&HeaderMap::new());
        drop(first);
        let second = entry.materialize(&HeaderMap::new());
        assert_eq!(second.body().as_ref(), br#"{"id":1}"#);
    }
}
