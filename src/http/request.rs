//! HTTP request value type

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use url::Url;

use crate::error::{Error, Result};

/// A buffered HTTP request.
///
/// Requests are plain values: cloning one is cheap (the body is [`Bytes`])
/// and the retry layer relies on that to re-execute a logical call without
/// touching the caller's original.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Request {
    /// Create a request from an already-parsed URL.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Create a request from a URL string.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the URL is empty or does not
    /// parse.
    pub fn parse(method: Method, url: &str) -> Result<Self> {
        if url.is_empty() {
            return Err(Error::InvalidArgument("request URL must not be empty".into()));
        }
        let url = Url::parse(url)
            .map_err(|e| Error::InvalidArgument(format!("invalid request URL {url:?}: {e}")))?;
        Ok(Self::new(method, url))
    }

    /// Convenience constructor for a GET request.
    pub fn get(url: &str) -> Result<Self> {
        Self::parse(Method::GET, url)
    }

    /// Set a header, replacing any existing value.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if the name or value is not a
    /// valid HTTP header.
    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::try_from(name)
            .map_err(|e| Error::InvalidArgument(format!("invalid header name {name:?}: {e}")))?;
        let value = HeaderValue::try_from(value)
            .map_err(|e| Error::InvalidArgument(format!("invalid header value: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Set the request body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Insert an already-validated header, replacing any existing value.
    pub(crate) fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Get the method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Get the URL.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get the headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get the body, if one was set.
    pub fn body_bytes(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }
}
