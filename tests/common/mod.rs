//! Shared test helpers: a scripted transport and canned API responses.

#![allow(dead_code)]

use std::sync::Mutex;

use async_trait::async_trait;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use octofort::{Request, Response, Result, Transport};

/// Transport that plays back a queue of outcomes, one per raw attempt, and
/// records every request it saw.
pub struct ScriptedTransport {
    outcomes: Mutex<Vec<Result<Response>>>,
    seen: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new(outcomes: Vec<Result<Response>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Number of raw attempts performed so far.
    pub fn attempts(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    /// Clone of the n-th request this transport received.
    pub fn request(&self, n: usize) -> Request {
        self.seen.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        self.seen.lock().unwrap().push(request);
        self.outcomes.lock().unwrap().remove(0)
    }
}

/// Build a response from a status, header pairs and a body.
pub fn response(status: StatusCode, headers: &[(&str, &str)], body: &str) -> Response {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(
            HeaderName::try_from(*name).unwrap(),
            HeaderValue::try_from(*value).unwrap(),
        );
    }
    Response::new(status, map, body.as_bytes().to_vec())
}

/// A 200 with an entity tag and a JSON body.
pub fn ok_with_etag(etag: &str, body: &str) -> Response {
    response(
        StatusCode::OK,
        &[("etag", etag), ("content-type", "application/json")],
        body,
    )
}

/// A rate-limit exhaustion answer with the given reset epoch seconds.
pub fn rate_limited(reset_epoch: i64) -> Response {
    response(
        StatusCode::FORBIDDEN,
        &[
            ("x-ratelimit-remaining", "0"),
            ("x-ratelimit-reset", &reset_epoch.to_string()),
        ],
        r#"{"message":"API rate limit exceeded for user"}"#,
    )
}

/// A secondary-rate-limit answer, optionally with a retry-after hint.
pub fn abuse(retry_after: Option<u64>) -> Response {
    let value;
    let mut headers: Vec<(&str, &str)> = vec![("x-ratelimit-remaining", "40")];
    if let Some(secs) = retry_after {
        value = secs.to_string();
        headers.push(("retry-after", &value));
    }
    response(
        StatusCode::FORBIDDEN,
        &headers,
        r#"{"message":"You have exceeded a secondary rate limit"}"#,
    )
}
